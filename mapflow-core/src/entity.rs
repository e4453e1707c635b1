//! Records carried through a dispatch run.
//!
//! Field sets mirror what the parsing collaborators produce. The engine only
//! ever looks at [`Entity::kind`]; everything else is for handlers.

use std::collections::BTreeMap;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::Kind;

/// OpenStreetMap-style key/value tags.
pub type Tags = BTreeMap<String, String>;

/// One element of an entity stream.
///
/// Serialized records are internally tagged with a `"type"` field, which is
/// also the framing used by [`crate::BufferSource`].
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use mapflow_core::{Entity, Kind, Node};
///
/// let entity = Entity::from(Node::new(7, Some(Coord { x: 13.4, y: 52.5 })));
/// assert_eq!(entity.kind(), Kind::Node);
/// assert_eq!(entity.id(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entity {
    /// A node record.
    Node(Node),
    /// A way record.
    Way(Way),
    /// A relation record.
    Relation(Relation),
    /// An area record.
    Area(Area),
    /// A changeset record.
    Changeset(Changeset),
}

impl Entity {
    /// The record's kind tag. Never [`Kind::Undefined`].
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Node(_) => Kind::Node,
            Self::Way(_) => Kind::Way,
            Self::Relation(_) => Kind::Relation,
            Self::Area(_) => Kind::Area,
            Self::Changeset(_) => Kind::Changeset,
        }
    }

    /// The raw identifier carried by the record.
    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Node(node) => node.id,
            Self::Way(way) => way.id,
            Self::Relation(relation) => relation.id,
            Self::Area(area) => area.id,
            Self::Changeset(changeset) => changeset.id,
        }
    }

    /// Tags attached to the record.
    #[must_use]
    pub const fn tags(&self) -> &Tags {
        match self {
            Self::Node(node) => &node.tags,
            Self::Way(way) => &way.tags,
            Self::Relation(relation) => &relation.tags,
            Self::Area(area) => &area.tags,
            Self::Changeset(changeset) => &changeset.tags,
        }
    }
}

/// A point feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier.
    pub id: i64,
    /// WGS84 position (`x = longitude`, `y = latitude`), absent when invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coord<f64>>,
    /// Node tags.
    #[serde(default)]
    pub tags: Tags,
}

impl Node {
    /// Construct an untagged node.
    #[must_use]
    pub const fn new(id: i64, location: Option<Coord<f64>>) -> Self {
        Self {
            id,
            location,
            tags: Tags::new(),
        }
    }

    /// Attach a tag, replacing any previous value for `key`.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// An ordered list of node references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Way {
    /// Way identifier.
    pub id: i64,
    /// Referenced node identifiers in path order.
    #[serde(default)]
    pub refs: Vec<i64>,
    /// Way tags.
    #[serde(default)]
    pub tags: Tags,
}

impl Way {
    /// Construct an untagged way.
    #[must_use]
    pub const fn new(id: i64, refs: Vec<i64>) -> Self {
        Self {
            id,
            refs,
            tags: Tags::new(),
        }
    }

    /// Attach a tag, replacing any previous value for `key`.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Returns `true` when the first and last references coincide.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.refs.len() > 1 && self.refs.first() == self.refs.last()
    }
}

/// The type of object a relation member points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    /// Member is a node.
    Node,
    /// Member is a way.
    Way,
    /// Member is another relation.
    Relation,
}

/// A single relation member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Type of the referenced object.
    pub member_type: MemberType,
    /// Identifier of the referenced object.
    pub id: i64,
    /// Role string, empty when unset.
    #[serde(default)]
    pub role: String,
}

impl Member {
    /// Construct a member.
    #[must_use]
    pub fn new(member_type: MemberType, id: i64, role: impl Into<String>) -> Self {
        Self {
            member_type,
            id,
            role: role.into(),
        }
    }
}

/// A typed group of members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Relation identifier.
    pub id: i64,
    /// Members in declaration order.
    #[serde(default)]
    pub members: Vec<Member>,
    /// Relation tags.
    #[serde(default)]
    pub tags: Tags,
}

impl Relation {
    /// Construct an untagged relation.
    #[must_use]
    pub const fn new(id: i64, members: Vec<Member>) -> Self {
        Self {
            id,
            members,
            tags: Tags::new(),
        }
    }

    /// Attach a tag, replacing any previous value for `key`.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// One polygon of an area: an outer ring and the inner rings it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaPolygon {
    /// Outer ring coordinates.
    pub outer: Vec<Coord<f64>>,
    /// Inner rings (holes) inside `outer`.
    #[serde(default)]
    pub inners: Vec<Vec<Coord<f64>>>,
}

/// A polygonal feature assembled from a closed way or a multipolygon
/// relation.
///
/// Area identifiers encode their origin: twice the source object id, plus
/// one when the source was a relation. Negative source ids keep their sign.
///
/// # Examples
///
/// ```
/// use mapflow_core::Area;
///
/// let area = Area::from_relation_id(21, Vec::new());
/// assert_eq!(area.id, 43);
/// assert_eq!(area.orig_id(), 21);
/// assert!(!area.from_way());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Encoded area identifier.
    pub id: i64,
    /// Polygons making up the area.
    #[serde(default)]
    pub polygons: Vec<AreaPolygon>,
    /// Area tags, copied from the source object.
    #[serde(default)]
    pub tags: Tags,
}

impl Area {
    /// Build an area assembled from the way with id `way_id`.
    #[must_use]
    pub fn from_way_id(way_id: i64, polygons: Vec<AreaPolygon>) -> Self {
        Self {
            id: encode_area_id(way_id, false),
            polygons,
            tags: Tags::new(),
        }
    }

    /// Build an area assembled from the relation with id `relation_id`.
    #[must_use]
    pub fn from_relation_id(relation_id: i64, polygons: Vec<AreaPolygon>) -> Self {
        Self {
            id: encode_area_id(relation_id, true),
            polygons,
            tags: Tags::new(),
        }
    }

    /// Attach a tag, replacing any previous value for `key`.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Identifier of the way or relation the area was built from.
    #[must_use]
    #[expect(
        clippy::integer_division,
        reason = "area ids store the source id in every bit above the lowest"
    )]
    pub const fn orig_id(&self) -> i64 {
        self.id / 2
    }

    /// Returns `true` when the area was assembled from a closed way.
    #[must_use]
    pub const fn from_way(&self) -> bool {
        (self.id & 1) == 0
    }
}

fn encode_area_id(object_id: i64, from_relation: bool) -> i64 {
    let encoded = object_id
        .saturating_abs()
        .saturating_mul(2)
        .saturating_add(i64::from(from_relation));
    if object_id < 0 { -encoded } else { encoded }
}

/// Metadata describing one edit session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    /// Changeset identifier.
    pub id: i64,
    /// Display name of the editing user.
    #[serde(default)]
    pub user: String,
    /// Number of changes in the session.
    #[serde(default)]
    pub num_changes: u32,
    /// Changeset tags.
    #[serde(default)]
    pub tags: Tags,
}

impl Changeset {
    /// Construct an untagged changeset.
    #[must_use]
    pub fn new(id: i64, user: impl Into<String>, num_changes: u32) -> Self {
        Self {
            id,
            user: user.into(),
            num_changes,
            tags: Tags::new(),
        }
    }
}

macro_rules! entity_from {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl From<$variant> for Entity {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

entity_from!(Node, Way, Relation, Area, Changeset);
