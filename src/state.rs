use std::sync::Arc;

use crate::message::service::MessageService;
use crate::notification::service::NotificationService;
use crate::receipt::service::ReceiptService;
use crate::storage::Store;
use crate::subscription::service::SubscriptionService;

/// The messaging core wired over one store collaborator. This is the whole
/// surface the UI collaborator sees: append and read through `messages`,
/// receipts through `receipts`, live feeds through `subscriptions`, and the
/// lawyer's aggregate through `notifications`.
#[derive(Clone)]
pub struct Core {
    pub messages: MessageService,
    pub receipts: ReceiptService,
    pub subscriptions: SubscriptionService,
    pub notifications: NotificationService,
}

impl Core {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let receipts = ReceiptService::new(store.clone());

        Self {
            messages: MessageService::new(store.clone()),
            subscriptions: SubscriptionService::new(store.clone(), receipts.clone()),
            notifications: NotificationService::new(store.clone()),
            receipts,
        }
    }
}
