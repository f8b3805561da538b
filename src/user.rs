use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Stable opaque identifier for one account, assigned by the identity
/// collaborator at account creation. The core never derives or verifies it.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Id(String);

impl Id {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Id, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Id(s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Lawyer,
}

/// Session identity supplied by the identity collaborator. The core trusts
/// the role as given and performs no authentication of its own.
#[derive(Clone, Debug)]
pub struct UserInfo {
    pub id: Id,
    pub name: String,
    pub picture: Option<String>,
    pub role: Role,
}

impl UserInfo {
    pub fn new(id: Id, name: impl Into<String>, picture: Option<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            picture,
            role,
        }
    }
}
