//! BigQuery dataset access entries
//!
//! Datasets take one access entry per member rather than role bindings. The
//! entry key depends on the kind of principal.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Dataset role aliases and the dataset role each one grants, in emission order
pub const DATASET_ACCESS_ALIASES: &[(&str, &str)] = &[
    ("owners", "OWNER"),
    ("readwrite", "WRITER"),
    ("readonly", "READER"),
];

/// Principal an access entry applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grantee {
    GroupByEmail(String),
    /// Users and service accounts
    UserByEmail(String),
    Domain(String),
    /// `allAuthenticatedUsers`, `projectReaders`, ...
    SpecialGroup(String),
}

impl Grantee {
    /// Parse an IAM member string (`group:a@x`, `user:b@x`, `domain:x`, `allUsers`)
    pub fn from_member(member: &str) -> Option<Self> {
        let Some((kind, id)) = member.split_once(':') else {
            return Some(Self::SpecialGroup(member.to_string()));
        };
        match kind {
            "group" => Some(Self::GroupByEmail(id.to_string())),
            "user" | "serviceAccount" => Some(Self::UserByEmail(id.to_string())),
            "domain" => Some(Self::Domain(id.to_string())),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::GroupByEmail(_) => "groupByEmail",
            Self::UserByEmail(_) => "userByEmail",
            Self::Domain(_) => "domain",
            Self::SpecialGroup(_) => "specialGroup",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::GroupByEmail(v)
            | Self::UserByEmail(v)
            | Self::Domain(v)
            | Self::SpecialGroup(v) => v,
        }
    }
}

/// `{role: ..., <grantee key>: ...}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEntry {
    pub role: String,
    pub grantee: Grantee,
}

impl AccessEntry {
    pub fn new(role: &str, grantee: Grantee) -> Self {
        Self {
            role: role.to_string(),
            grantee,
        }
    }
}

impl Serialize for AccessEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("role", &self.role)?;
        map.serialize_entry(self.grantee.key(), self.grantee.value())?;
        map.end()
    }
}
