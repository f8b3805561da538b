use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::user;

type Result<T> = std::result::Result<T, Error>;

const SEPARATOR: char = '_';

/// Identifier of a two-party conversation, derived from the participant
/// pair. Both sides compute it locally, so a conversation needs no
/// creation record to exist.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Id(String);

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recovers the unordered participant pair. `None` when the id was not
    /// produced by `resolve`.
    pub fn members(&self) -> Option<(user::Id, user::Id)> {
        let (a, b) = self.0.split_once(SEPARATOR)?;
        if a.is_empty() || b.is_empty() || b.contains(SEPARATOR) {
            return None;
        }
        Some((user::Id::new(a), user::Id::new(b)))
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Id, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Id(s))
    }
}

/// Derives the conversation id for a participant pair. Pure and symmetric:
/// `resolve(a, b) == resolve(b, a)` for every valid pair, so both clients
/// land in the same conversation regardless of who initiates it.
pub fn resolve(a: &user::Id, b: &user::Id) -> Result<Id> {
    validate(a)?;
    validate(b)?;

    if a == b {
        return Err(Error::InvalidParticipant(
            "a participant cannot converse with themself".to_owned(),
        ));
    }

    let (first, second) = if a <= b { (a, b) } else { (b, a) };

    Ok(Id(format!("{first}{SEPARATOR}{second}")))
}

fn validate(id: &user::Id) -> Result<()> {
    if id.as_str().is_empty() {
        return Err(Error::InvalidParticipant(
            "participant id is empty".to_owned(),
        ));
    }

    // The separator is reserved so distinct pairs can never collide.
    if id.as_str().contains(SEPARATOR) {
        return Err(Error::InvalidParticipant(format!(
            "participant id {id} contains the reserved separator '{SEPARATOR}'"
        )));
    }

    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid participant: {0}")]
    InvalidParticipant(String),
}
