use crate::storage;

type Result<T> = std::result::Result<T, Error>;

pub mod service {
    use std::sync::Arc;

    use log::debug;

    use crate::storage::Store;
    use crate::user::{Role, UserInfo};
    use crate::{message, receipt, room};

    /// Controlled-mutation gateway onto the message log's `read` field, kept
    /// apart from `append` because it carries a different authorization rule:
    /// only the message's non-sender, and only when that non-sender is the
    /// lawyer, may flip it.
    #[derive(Clone)]
    pub struct ReceiptService {
        store: Arc<dyn Store>,
    }

    impl ReceiptService {
        pub fn new(store: Arc<dyn Store>) -> Self {
            Self { store }
        }
    }

    impl ReceiptService {
        /// Marks one message read on behalf of `reader`. Idempotent: a
        /// missing or already-read message is a benign no-op. The capability
        /// check lives here, not in caller conditionals, so a buggy or
        /// malicious client cannot author a transition on the lawyer's
        /// behalf.
        pub async fn mark_read(
            &self,
            room_id: &room::Id,
            id: &message::Id,
            reader: &UserInfo,
        ) -> super::Result<()> {
            if reader.role != Role::Lawyer {
                return Err(receipt::Error::Forbidden(
                    "only a lawyer may mark messages read",
                ));
            }

            let messages = self.store.messages(room_id).await?;
            let Some(msg) = messages.iter().find(|m| m.id() == id) else {
                debug!("mark_read on unknown message {id}, ignoring");
                return Ok(());
            };

            if msg.owner() == &reader.id {
                return Err(receipt::Error::Forbidden(
                    "a sender may not mark their own message read",
                ));
            }

            if msg.read() {
                return Ok(());
            }

            let flipped = self.store.mark_read(room_id, id).await?;
            if !flipped {
                // Lost a race with a concurrent marker; same end state.
                debug!("message {id} was already read");
            }

            Ok(())
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("read receipt forbidden: {0}")]
    Forbidden(&'static str),

    _Storage(#[from] storage::Error),
}
