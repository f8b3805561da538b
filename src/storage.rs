use async_trait::async_trait;
use tokio::sync::watch;

use crate::message::model::Message;
use crate::{message, room, user};

type Result<T> = std::result::Result<T, Error>;

/// Push handle for one room: always holds the latest full ordered snapshot.
/// Intermediate snapshots may be coalesced; observers never see an older
/// snapshot after a newer one.
pub type MessagesRx = watch::Receiver<Vec<Message>>;

/// Push handle for the participant index: the set of rooms one participant
/// is a member of, updated transactionally with `append`.
pub type RoomsRx = watch::Receiver<Vec<room::Id>>;

/// A message before the store has assigned its id and ordering key.
pub struct Draft {
    owner: user::Id,
    owner_name: String,
    owner_picture: Option<String>,
    text: String,
    read: bool,
}

impl Draft {
    pub fn new(
        owner: user::Id,
        owner_name: String,
        owner_picture: Option<String>,
        text: impl Into<String>,
        read: bool,
    ) -> Self {
        Self {
            owner,
            owner_name,
            owner_picture,
            text: text.into(),
            read,
        }
    }
}

/// Persistent-store collaborator boundary. Implementations must provide
/// atomic append with a server-assigned per-room monotonic ordering key,
/// atomic single-field read updates, per-room push snapshots, and a
/// write-time participant index, so that conversation discovery never
/// requires a scan of the whole conversation universe.
#[async_trait]
pub trait Store: Send + Sync {
    /// Atomically appends a message, assigning its id and `(created_at, seq)`
    /// key, updates the participant index, and republishes the room snapshot.
    async fn append(&self, room_id: &room::Id, draft: Draft) -> Result<Message>;

    /// Current snapshot in key order. An unknown room is an empty sequence.
    async fn messages(&self, room_id: &room::Id) -> Result<Vec<Message>>;

    /// One-way read flip. `Ok(false)` when the message is missing or already
    /// read, so concurrent markers cannot fail each other.
    async fn mark_read(&self, room_id: &room::Id, id: &message::Id) -> Result<bool>;

    /// Attaches to the room's push snapshot. Subscribing to a room with no
    /// messages yet is valid and observes an empty sequence.
    async fn watch(&self, room_id: &room::Id) -> Result<MessagesRx>;

    /// Rooms the participant is currently a member of.
    async fn rooms_of(&self, participant: &user::Id) -> Result<Vec<room::Id>>;

    /// Attaches to the participant index, observing rooms as they appear.
    async fn watch_rooms(&self, participant: &user::Id) -> Result<RoomsRx>;
}

pub mod memory {
    use std::collections::HashMap;
    use std::sync::Arc;

    use log::debug;
    use tokio::sync::{RwLock, watch};
    use uuid::Uuid;

    use crate::message::model::Message;
    use crate::{message, room, storage, user};

    use super::{Draft, MessagesRx, RoomsRx, Store};

    struct RoomState {
        messages: Vec<Message>,
        last_created_at: i64,
        last_seq: i32,
        feed: watch::Sender<Vec<Message>>,
    }

    impl RoomState {
        fn new() -> Self {
            let (feed, _) = watch::channel(Vec::new());
            Self {
                messages: Vec::new(),
                last_created_at: 0,
                last_seq: 0,
                feed,
            }
        }

        /// Server-side ordering key. The clock never goes backward within a
        /// room: a stalled or skewed clock pins `created_at` and bumps `seq`.
        fn next_key(&mut self) -> (i64, i32) {
            let now = chrono::Utc::now().timestamp_millis();
            if now > self.last_created_at {
                self.last_created_at = now;
                self.last_seq = 0;
            } else {
                self.last_seq += 1;
            }
            (self.last_created_at, self.last_seq)
        }

        fn republish(&self) {
            self.feed.send_replace(self.messages.clone());
        }
    }

    /// In-process reference implementation of the store collaborator. Rooms
    /// exist implicitly: any lookup of an unknown room yields an empty
    /// sequence, and the first append materialises the state.
    #[derive(Clone)]
    pub struct MemoryStore {
        rooms: Arc<RwLock<HashMap<room::Id, RoomState>>>,
        index: Arc<RwLock<HashMap<user::Id, watch::Sender<Vec<room::Id>>>>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self {
                rooms: Arc::new(RwLock::new(HashMap::new())),
                index: Arc::new(RwLock::new(HashMap::new())),
            }
        }
    }

    impl Default for MemoryStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait::async_trait]
    impl Store for MemoryStore {
        async fn append(&self, room_id: &room::Id, draft: Draft) -> storage::Result<Message> {
            let (a, b) = room_id
                .members()
                .ok_or_else(|| storage::Error::MalformedRoom(room_id.clone()))?;

            let mut rooms = self.rooms.write().await;
            let state = rooms
                .entry(room_id.clone())
                .or_insert_with(RoomState::new);

            let (created_at, seq) = state.next_key();
            let msg = Message::assigned(
                Uuid::new_v4(),
                room_id.clone(),
                draft.owner,
                draft.owner_name,
                draft.owner_picture,
                draft.text,
                created_at,
                seq,
                draft.read,
            );

            state.messages.push(msg.clone());
            state.republish();

            // index maintenance happens inside the append critical section,
            // so discovery never observes an unindexed conversation
            self.index_room(&a, room_id).await;
            self.index_room(&b, room_id).await;

            Ok(msg)
        }

        async fn messages(&self, room_id: &room::Id) -> storage::Result<Vec<Message>> {
            let rooms = self.rooms.read().await;
            Ok(rooms
                .get(room_id)
                .map(|state| state.messages.clone())
                .unwrap_or_default())
        }

        async fn mark_read(&self, room_id: &room::Id, id: &message::Id) -> storage::Result<bool> {
            let mut rooms = self.rooms.write().await;

            let Some(state) = rooms.get_mut(room_id) else {
                return Ok(false);
            };
            let Some(msg) = state.messages.iter_mut().find(|m| m.id() == id) else {
                return Ok(false);
            };
            if msg.read() {
                return Ok(false);
            }

            msg.mark_read();
            state.republish();

            Ok(true)
        }

        async fn watch(&self, room_id: &room::Id) -> storage::Result<MessagesRx> {
            let mut rooms = self.rooms.write().await;
            let state = rooms
                .entry(room_id.clone())
                .or_insert_with(RoomState::new);

            Ok(state.feed.subscribe())
        }

        async fn rooms_of(&self, participant: &user::Id) -> storage::Result<Vec<room::Id>> {
            let index = self.index.read().await;
            Ok(index
                .get(participant)
                .map(|feed| feed.borrow().clone())
                .unwrap_or_default())
        }

        async fn watch_rooms(&self, participant: &user::Id) -> storage::Result<RoomsRx> {
            let mut index = self.index.write().await;
            let feed = index
                .entry(participant.clone())
                .or_insert_with(|| watch::channel(Vec::new()).0);

            Ok(feed.subscribe())
        }
    }

    impl MemoryStore {
        async fn index_room(&self, participant: &user::Id, room_id: &room::Id) {
            let mut index = self.index.write().await;
            let feed = index
                .entry(participant.clone())
                .or_insert_with(|| watch::channel(Vec::new()).0);

            let known = feed.borrow().contains(room_id);
            if !known {
                debug!("indexing room {room_id} for {participant}");
                feed.send_modify(|rooms| rooms.push(room_id.clone()));
            }
        }
    }

}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed room id: {0}")]
    MalformedRoom(room::Id),
}
