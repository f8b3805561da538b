use crate::{storage, user};

type Result<T> = std::result::Result<T, Error>;

pub mod model {
    use std::sync::Arc;

    use serde::Serialize;
    use tokio::sync::Notify;
    use tokio::task::JoinHandle;

    use crate::message::model::LastMessage;
    use crate::{room, user};

    /// Derived summary of one conversation as seen by the watching lawyer.
    /// Never persisted: discarded and recomputed on every relevant change.
    #[derive(Clone, Debug, Serialize, PartialEq, Eq)]
    pub struct NotificationEntry {
        pub room_id: room::Id,
        pub recipient: user::Id,
        pub recipient_name: String,
        pub last_message: LastMessage,
        pub unread_count: usize,
    }

    /// Cancellation handle for one lawyer's live notification feed.
    pub struct Watch {
        pub(crate) close: Arc<Notify>,
        pub(crate) task: JoinHandle<()>,
    }
}

pub mod service {
    use std::collections::BTreeSet;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    use async_stream::stream;
    use futures::stream::SelectAll;
    use futures::{Stream, StreamExt};
    use log::{debug, error, warn};
    use tokio::sync::Notify;
    use tokio::time::sleep;

    use crate::storage::{MessagesRx, RoomsRx, Store};
    use crate::user::{Role, UserInfo};
    use crate::{notification, room, storage, user};

    use super::model::{NotificationEntry, Watch};

    type RoomFeed = Pin<Box<dyn Stream<Item = room::Id> + Send>>;

    const RETRY_BACKOFF: Duration = Duration::from_secs(1);

    #[derive(Clone)]
    pub struct NotificationService {
        store: Arc<dyn Store>,
    }

    impl NotificationService {
        pub fn new(store: Arc<dyn Store>) -> Self {
            Self { store }
        }
    }

    impl NotificationService {
        /// Starts the live feed for one lawyer: an immediate delivery built
        /// from the participant index, then a fresh, fully re-sorted list on
        /// every change to any conversation that includes them, including
        /// conversations that first appear while the watch is running.
        pub async fn start_watching(
            &self,
            lawyer: &UserInfo,
            on_update: impl Fn(Vec<NotificationEntry>) + Send + Sync + 'static,
        ) -> super::Result<Watch> {
            if lawyer.role != Role::Lawyer {
                return Err(notification::Error::NotLawyer(lawyer.id.clone()));
            }

            let rooms_rx = self.store.watch_rooms(&lawyer.id).await?;

            let close = Arc::new(Notify::new());
            let task = tokio::spawn(run(
                self.store.clone(),
                lawyer.id.clone(),
                rooms_rx,
                on_update,
                close.clone(),
            ));

            debug!("started notification watch for {}", lawyer.id);

            Ok(Watch { close, task })
        }

        /// Detaches every underlying room observation. Once this returns, no
        /// further `on_update` delivery occurs for that watch.
        pub async fn stop_watching(&self, watch: Watch) {
            watch.close.notify_one();
            if let Err(e) = watch.task.await {
                error!("notification watch task panicked: {e}");
            }
        }
    }

    async fn run<F>(
        store: Arc<dyn Store>,
        lawyer: user::Id,
        mut rooms_rx: RoomsRx,
        on_update: F,
        close: Arc<Notify>,
    ) where
        F: Fn(Vec<NotificationEntry>) + Send + Sync + 'static,
    {
        let mut feeds: SelectAll<RoomFeed> = SelectAll::new();
        let mut watched: BTreeSet<room::Id> = BTreeSet::new();

        let rooms = rooms_rx.borrow_and_update().clone();
        attach_new(&store, &rooms, &mut watched, &mut feeds).await;
        deliver(&store, &lawyer, &watched, &on_update).await;

        loop {
            tokio::select! {
                _ = close.notified() => break,

                changed = rooms_rx.changed() => {
                    if changed.is_err() {
                        match rewatch_index(store.as_ref(), &lawyer, &close).await {
                            Some(fresh) => rooms_rx = fresh,
                            None => break,
                        }
                    }
                    let rooms = rooms_rx.borrow_and_update().clone();
                    attach_new(&store, &rooms, &mut watched, &mut feeds).await;
                    deliver(&store, &lawyer, &watched, &on_update).await;
                }

                // resolves to None while no room is attached; the branch is
                // re-armed on the next loop iteration
                Some(room_id) = feeds.next() => {
                    debug!("room {room_id} changed, recomputing notifications");
                    deliver(&store, &lawyer, &watched, &on_update).await;
                }
            }
        }

        debug!("notification watch for {lawyer} stopped");
    }

    /// Turns a room's snapshot feed into a stream of change ticks. The tick
    /// carries only the room id; the aggregation re-reads every watched room
    /// so the delivered list is always internally consistent.
    fn room_feed(mut rx: MessagesRx, room_id: room::Id) -> RoomFeed {
        Box::pin(stream! {
            while rx.changed().await.is_ok() {
                yield room_id.clone();
            }
        })
    }

    async fn attach_new(
        store: &Arc<dyn Store>,
        rooms: &[room::Id],
        watched: &mut BTreeSet<room::Id>,
        feeds: &mut SelectAll<RoomFeed>,
    ) {
        for room_id in rooms {
            if watched.contains(room_id) {
                continue;
            }
            match store.watch(room_id).await {
                Ok(rx) => {
                    watched.insert(room_id.clone());
                    feeds.push(room_feed(rx, room_id.clone()));
                }
                Err(e) => warn!("could not attach to room {room_id}: {e}"),
            }
        }
    }

    async fn deliver<F>(
        store: &Arc<dyn Store>,
        lawyer: &user::Id,
        watched: &BTreeSet<room::Id>,
        on_update: &F,
    ) where
        F: Fn(Vec<NotificationEntry>),
    {
        match collect(store.as_ref(), lawyer, watched).await {
            Ok(entries) => on_update(entries),
            // degraded: keep the previous list, notifications are
            // temporarily unavailable rather than gone
            Err(e) => warn!("could not recompute notifications for {lawyer}: {e}"),
        }
    }

    async fn collect(
        store: &dyn Store,
        lawyer: &user::Id,
        watched: &BTreeSet<room::Id>,
    ) -> std::result::Result<Vec<NotificationEntry>, storage::Error> {
        let mut keyed = Vec::with_capacity(watched.len());

        for room_id in watched {
            let messages = store.messages(room_id).await?;
            let Some(last) = messages.last() else {
                continue;
            };

            let Some((a, b)) = room_id.members() else {
                warn!("skipping malformed room id {room_id}");
                continue;
            };
            let recipient = if &a == lawyer { b } else { a };

            let recipient_name = messages
                .iter()
                .rev()
                .find(|m| m.owner() == &recipient)
                .map(|m| m.owner_name().to_owned())
                .unwrap_or_else(|| recipient.to_string());

            let unread_count = messages
                .iter()
                .filter(|m| m.owner() != lawyer && !m.read())
                .count();

            keyed.push((
                last.sort_key(),
                NotificationEntry {
                    room_id: room_id.clone(),
                    recipient,
                    recipient_name,
                    last_message: last.into(),
                    unread_count,
                },
            ));
        }

        // most recently active first, room id as the deterministic tie-break
        keyed.sort_by(|(ka, ea), (kb, eb)| {
            kb.cmp(ka).then_with(|| ea.room_id.cmp(&eb.room_id))
        });

        Ok(keyed.into_iter().map(|(_, entry)| entry).collect())
    }

    /// The index feed went away. Keep the current per-room observations and
    /// re-attach to the index with backoff, unless the watch is cancelled.
    async fn rewatch_index(
        store: &dyn Store,
        lawyer: &user::Id,
        close: &Notify,
    ) -> Option<RoomsRx> {
        loop {
            warn!("lost participant index feed for {lawyer}, re-attaching");

            tokio::select! {
                _ = close.notified() => return None,
                _ = sleep(RETRY_BACKOFF) => {}
            }

            match store.watch_rooms(lawyer).await {
                Ok(rx) => return Some(rx),
                Err(e) => error!("re-attach to index for {lawyer} failed: {e}"),
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("watcher {0} is not a lawyer")]
    NotLawyer(user::Id),

    _Storage(#[from] storage::Error),
}
