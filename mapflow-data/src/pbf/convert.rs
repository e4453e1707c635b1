//! Conversion from `osmpbf` elements into owned records.

use geo::Coord;
use log::warn;
use mapflow_core::{Entity, Member, MemberType, Node, Relation, Tags, Way};
use osmpbf::{Element, RelMemberType};

pub(super) fn convert_element(element: Element<'_>) -> Entity {
    match element {
        Element::Node(node) => node_entity(node.id(), node.lon(), node.lat(), node.tags()),
        Element::DenseNode(node) => node_entity(node.id(), node.lon(), node.lat(), node.tags()),
        Element::Way(way) => Entity::Way(Way {
            id: way.id(),
            refs: way.refs().collect(),
            tags: collect_tags(way.tags()),
        }),
        Element::Relation(relation) => Entity::Relation(Relation {
            id: relation.id(),
            members: collect_members(&relation),
            tags: collect_tags(relation.tags()),
        }),
    }
}

fn node_entity<'a, T>(id: i64, lon: f64, lat: f64, tags: T) -> Entity
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    let location = validated_coord(lon, lat);
    if location.is_none() {
        warn!("Node {id} has an invalid location ({lon}, {lat}); keeping it without one");
    }
    Entity::Node(Node {
        id,
        location,
        tags: collect_tags(tags),
    })
}

fn collect_members(relation: &osmpbf::Relation<'_>) -> Vec<Member> {
    relation
        .members()
        .map(|member| {
            let role = member.role().map_or_else(
                |err| {
                    warn!(
                        "Relation {} member {} has an undecodable role; using an empty role: {err}",
                        relation.id(),
                        member.member_id
                    );
                    String::new()
                },
                str::to_owned,
            );
            Member {
                member_type: member_type(member.member_type),
                id: member.member_id,
                role,
            }
        })
        .collect()
}

const fn member_type(raw: RelMemberType) -> MemberType {
    match raw {
        RelMemberType::Node => MemberType::Node,
        RelMemberType::Way => MemberType::Way,
        RelMemberType::Relation => MemberType::Relation,
    }
}

pub(super) fn collect_tags<'a, T>(tags: T) -> Tags
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter()
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .collect()
}

pub(super) fn validated_coord(lon: f64, lat: f64) -> Option<Coord<f64>> {
    (lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat))
    .then_some(Coord { x: lon, y: lat })
}
