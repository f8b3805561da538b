use crate::storage;

type Result<T> = std::result::Result<T, Error>;

pub mod model {
    use std::pin::Pin;
    use std::sync::Arc;

    use futures::{Stream, StreamExt};
    use tokio::sync::Notify;

    use crate::message::model::Message;

    /// Push channel for one room: every item is the full ordered message
    /// sequence as of some point in time, and items only move forward.
    pub type MessageFeed = Pin<Box<dyn Stream<Item = Vec<Message>> + Send>>;

    /// Live attachment to one room, held by one observer. Dropping it or
    /// calling `unsubscribe` detaches; the underlying store is never blocked
    /// by a slow holder because the feed coalesces to the latest snapshot.
    pub struct Subscription {
        feed: MessageFeed,
        close: Arc<Notify>,
    }

    impl Subscription {
        pub(crate) fn new(feed: MessageFeed, close: Arc<Notify>) -> Self {
            Self { feed, close }
        }

        /// Next snapshot, `None` once the subscription is closed.
        pub async fn next(&mut self) -> Option<Vec<Message>> {
            self.feed.next().await
        }

        /// Detaches the observer. No delivery occurs after this returns.
        pub fn unsubscribe(self) {
            self.close.notify_one();
        }
    }
}

pub mod service {
    use std::sync::Arc;
    use std::time::Duration;

    use async_stream::stream;
    use log::{debug, error, warn};
    use tokio::sync::Notify;
    use tokio::time::sleep;

    use crate::message::model::Message;
    use crate::receipt::service::ReceiptService;
    use crate::room;
    use crate::storage::{MessagesRx, Store};
    use crate::user::{Role, UserInfo};

    use super::model::Subscription;

    const RETRY_BACKOFF: Duration = Duration::from_secs(1);

    #[derive(Clone)]
    pub struct SubscriptionService {
        store: Arc<dyn Store>,
        receipts: ReceiptService,
    }

    impl SubscriptionService {
        pub fn new(store: Arc<dyn Store>, receipts: ReceiptService) -> Self {
            Self { store, receipts }
        }
    }

    impl SubscriptionService {
        /// Attaches an observer to a room. The first delivery is the current
        /// snapshot (possibly empty, since rooms exist implicitly); every
        /// change to the room produces a further delivery. When the observer
        /// is the lawyer, each delivery marks the unread messages of the
        /// other participant read, best-effort.
        pub async fn subscribe(
            &self,
            room_id: &room::Id,
            observer: &UserInfo,
        ) -> super::Result<Subscription> {
            let mut rx = self.store.watch(room_id).await?;

            let close = Arc::new(Notify::new());
            let token = close.clone();
            let store = self.store.clone();
            let receipts = self.receipts.clone();
            let room_id = room_id.clone();
            let observer = observer.clone();

            debug!("{} subscribed to room {room_id}", observer.id);

            let feed = Box::pin(stream! {
                loop {
                    let snapshot = rx.borrow_and_update().clone();
                    acknowledge(&receipts, &room_id, &observer, &snapshot).await;
                    yield snapshot;

                    tokio::select! {
                        _ = token.notified() => break,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                match reattach(store.as_ref(), &room_id, &token).await {
                                    Some(fresh) => rx = fresh,
                                    None => break,
                                }
                            }
                        }
                    }
                }
            });

            Ok(Subscription::new(feed, close))
        }
    }

    /// Read-receipt trigger on the delivery path: a lawyer observing a
    /// snapshot marks every unread message they did not send. Runs before
    /// the snapshot is handed over, so a single poll issues the receipts.
    /// Failures are logged and retried on the next delivery rather than
    /// surfaced.
    async fn acknowledge(
        receipts: &ReceiptService,
        room_id: &room::Id,
        observer: &UserInfo,
        snapshot: &[Message],
    ) {
        if observer.role != Role::Lawyer {
            return;
        }

        for msg in snapshot
            .iter()
            .filter(|m| m.owner() != &observer.id && !m.read())
        {
            if let Err(e) = receipts.mark_read(room_id, msg.id(), observer).await {
                warn!("failed to mark message {} read: {e}", msg.id());
            }
        }
    }

    /// Degraded mode: the store's push feed went away. The subscription keeps
    /// the last known-good snapshot and keeps trying to re-attach until it
    /// succeeds or the observer cancels.
    async fn reattach(
        store: &dyn Store,
        room_id: &room::Id,
        close: &Notify,
    ) -> Option<MessagesRx> {
        loop {
            warn!("lost push feed for room {room_id}, re-attaching");

            tokio::select! {
                _ = close.notified() => return None,
                _ = sleep(RETRY_BACKOFF) => {}
            }

            match store.watch(room_id).await {
                Ok(rx) => {
                    debug!("re-attached to room {room_id}");
                    return Some(rx);
                }
                Err(e) => error!("re-attach to room {room_id} failed: {e}"),
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _Storage(#[from] storage::Error),
}
