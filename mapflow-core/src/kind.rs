//! Record kinds and the synthetic stream boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag distinguishing the categories of records in an entity stream.
///
/// [`Kind::Undefined`] never tags a real record. It marks the boundary before
/// the first record and after the last one, which is what lets the engine
/// express the start and end of a run as ordinary transitions.
///
/// # Examples
///
/// ```
/// use mapflow_core::Kind;
///
/// assert!(Kind::Way.is_real());
/// assert!(!Kind::Undefined.is_real());
/// assert_eq!(Kind::Relation.to_string(), "relation");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Stream boundary; never attached to a record.
    Undefined,
    /// A point with an optional location.
    Node,
    /// An ordered list of node references.
    Way,
    /// A typed group of members.
    Relation,
    /// An assembled polygonal feature.
    Area,
    /// Metadata about an edit session.
    Changeset,
}

impl Kind {
    /// Every kind that can tag a real record, in canonical stream order.
    pub const REAL: [Self; 5] = [
        Self::Node,
        Self::Way,
        Self::Relation,
        Self::Area,
        Self::Changeset,
    ];

    /// Returns `true` unless this is the [`Kind::Undefined`] boundary.
    #[must_use]
    pub const fn is_real(self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Lowercase name used in logs and serialized output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
            Self::Area => "area",
            Self::Changeset => "changeset",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
