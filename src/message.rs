use crate::storage;

type Result<T> = std::result::Result<T, Error>;
pub type Id = uuid::Uuid;

pub mod model {
    use serde::Serialize;

    use crate::{room, user};

    use super::Id;

    /// One unit of conversation content. `text`, sender and ordering key are
    /// immutable once assigned by the store; only `read` may transition, and
    /// only from `false` to `true`.
    #[derive(Clone, Debug, Serialize, PartialEq, Eq)]
    pub struct Message {
        id: Id,
        room_id: room::Id,
        owner: user::Id,
        owner_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        owner_picture: Option<String>,
        text: String,
        created_at: i64,
        seq: i32,
        read: bool,
    }

    impl Message {
        /// Store-side constructor, invoked once the ordering key is assigned.
        pub(crate) fn assigned(
            id: Id,
            room_id: room::Id,
            owner: user::Id,
            owner_name: String,
            owner_picture: Option<String>,
            text: String,
            created_at: i64,
            seq: i32,
            read: bool,
        ) -> Self {
            Self {
                id,
                room_id,
                owner,
                owner_name,
                owner_picture,
                text,
                created_at,
                seq,
                read,
            }
        }

        pub const fn id(&self) -> &Id {
            &self.id
        }

        pub const fn room_id(&self) -> &room::Id {
            &self.room_id
        }

        pub const fn owner(&self) -> &user::Id {
            &self.owner
        }

        pub fn owner_name(&self) -> &str {
            &self.owner_name
        }

        pub fn owner_picture(&self) -> Option<&str> {
            self.owner_picture.as_deref()
        }

        pub fn text(&self) -> &str {
            &self.text
        }

        pub const fn created_at(&self) -> i64 {
            self.created_at
        }

        pub const fn seq(&self) -> i32 {
            self.seq
        }

        pub const fn read(&self) -> bool {
            self.read
        }

        /// Total order within a room: `created_at`, ties broken by `seq`.
        pub(crate) const fn sort_key(&self) -> (i64, i32) {
            (self.created_at, self.seq)
        }

        /// One-way transition; flipping an already-read message is a no-op.
        pub(crate) fn mark_read(&mut self) {
            self.read = true;
        }
    }

    /// Summary of a room's most recent message, used by notifications.
    #[derive(Clone, Debug, Serialize, PartialEq, Eq)]
    pub struct LastMessage {
        pub id: Id,
        pub owner: user::Id,
        pub text: String,
        pub created_at: i64,
    }

    impl From<&Message> for LastMessage {
        fn from(msg: &Message) -> Self {
            Self {
                id: *msg.id(),
                owner: msg.owner().clone(),
                text: msg.text().to_owned(),
                created_at: msg.created_at(),
            }
        }
    }
}

pub mod service {
    use std::sync::Arc;

    use log::debug;

    use crate::room;
    use crate::storage::{Draft, Store};
    use crate::user::{Role, UserInfo};

    use super::model::Message;
    use crate::message;

    #[derive(Clone)]
    pub struct MessageService {
        store: Arc<dyn Store>,
    }

    impl MessageService {
        pub fn new(store: Arc<dyn Store>) -> Self {
            Self { store }
        }
    }

    impl MessageService {
        /// Appends a message to the room. Validation happens before any store
        /// call, so a rejected send leaves no partial state. The store assigns
        /// the id and the monotonic ordering key; a lawyer's own message is
        /// born read.
        pub async fn create(
            &self,
            room_id: &room::Id,
            sender: &UserInfo,
            text: &str,
        ) -> super::Result<Message> {
            if sender.id.as_str().is_empty() {
                return Err(message::Error::NotAuthenticated);
            }

            let text = text.trim();
            if text.is_empty() {
                return Err(message::Error::EmptyMessage);
            }

            if room_id.members().is_none() {
                return Err(message::Error::NotFound(None));
            }

            let read = sender.role == Role::Lawyer;
            let draft = Draft::new(
                sender.id.clone(),
                sender.name.clone(),
                sender.picture.clone(),
                text,
                read,
            );

            let msg = self.store.append(room_id, draft).await?;
            debug!("appended message {} to room {room_id}", msg.id());

            Ok(msg)
        }

        /// Full snapshot of the room in `(created_at, seq)` order. A room
        /// with no messages yet yields an empty sequence, never an error.
        pub async fn find_by_room_id(&self, room_id: &room::Id) -> super::Result<Vec<Message>> {
            let messages = self.store.messages(room_id).await?;
            Ok(messages)
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("message text is empty")]
    EmptyMessage,
    #[error("sender is not authenticated")]
    NotAuthenticated,
    #[error("message not found: {0:?}")]
    NotFound(Option<Id>),

    _Storage(#[from] storage::Error),
}
