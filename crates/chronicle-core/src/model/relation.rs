//! The seven relation types an edge can carry.
//!
//! String form is the lowercase name used on the wire
//! (`causal`, `temporal`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of relation kinds between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationType {
    /// Source brought about the target.
    Causal,
    /// Target merely follows the source in time.
    Temporal,
    /// Source had to happen before the target could.
    Prerequisite,
    /// Source and target unfold side by side.
    Parallel,
    /// Target is built on, or derived from, the source.
    Derived,
    /// Target relies on the source.
    Dependency,
    /// Source and target co-vary without an asserted direction of cause.
    Correlated,
}

/// Error returned when parsing an unknown relation type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRelationType {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownRelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown relation type '{}': expected one of causal, temporal, \
             prerequisite, parallel, derived, dependency, correlated",
            self.raw
        )
    }
}

impl std::error::Error for UnknownRelationType {}

impl RelationType {
    pub const ALL: [Self; 7] = [
        Self::Causal,
        Self::Temporal,
        Self::Prerequisite,
        Self::Parallel,
        Self::Derived,
        Self::Dependency,
        Self::Correlated,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Causal => "causal",
            Self::Temporal => "temporal",
            Self::Prerequisite => "prerequisite",
            Self::Parallel => "parallel",
            Self::Derived => "derived",
            Self::Dependency => "dependency",
            Self::Correlated => "correlated",
        }
    }

    /// `true` for the relation types that make the source a parent node.
    #[must_use]
    pub const fn is_lineage(self) -> bool {
        matches!(self, Self::Causal | Self::Derived)
    }

    /// `true` for the relation types answered by prerequisite queries.
    #[must_use]
    pub const fn is_precondition(self) -> bool {
        matches!(self, Self::Prerequisite | Self::Dependency)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = UnknownRelationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "causal" => Ok(Self::Causal),
            "temporal" => Ok(Self::Temporal),
            "prerequisite" => Ok(Self::Prerequisite),
            "parallel" => Ok(Self::Parallel),
            "derived" => Ok(Self::Derived),
            "dependency" => Ok(Self::Dependency),
            "correlated" => Ok(Self::Correlated),
            _ => Err(UnknownRelationType { raw: s.to_string() }),
        }
    }
}

impl Serialize for RelationType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelationType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_wire_names() {
        let names: Vec<String> = RelationType::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            [
                "causal",
                "temporal",
                "prerequisite",
                "parallel",
                "derived",
                "dependency",
                "correlated"
            ]
        );
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Causal".parse::<RelationType>(), Ok(RelationType::Causal));
        assert_eq!(
            " dependency ".parse::<RelationType>(),
            Ok(RelationType::Dependency)
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "blocks".parse::<RelationType>().unwrap_err();
        assert_eq!(err.raw, "blocks");
        assert!(err.to_string().contains("unknown relation type 'blocks'"));
    }

    #[test]
    fn serde_uses_lowercase_strings() {
        let json = serde_json::to_string(&RelationType::Prerequisite).unwrap();
        assert_eq!(json, "\"prerequisite\"");
        let back: RelationType = serde_json::from_str("\"parallel\"").unwrap();
        assert_eq!(back, RelationType::Parallel);
        assert!(serde_json::from_str::<RelationType>("\"nope\"").is_err());
    }

    #[test]
    fn lineage_types_are_causal_and_derived() {
        let lineage: Vec<_> = RelationType::ALL
            .into_iter()
            .filter(|r| r.is_lineage())
            .collect();
        assert_eq!(lineage, vec![RelationType::Causal, RelationType::Derived]);
    }
}
