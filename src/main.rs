use std::sync::Arc;

use log::info;
use tokio::sync::mpsc;

use counsel_messaging::state::Core;
use counsel_messaging::storage::memory::MemoryStore;
use counsel_messaging::user::{Id, Role, UserInfo};
use counsel_messaging::{room, settings};

/// Walks the client/lawyer scenario end to end over the in-memory store:
/// a client opens a conversation, the lawyer's subscription picks it up and
/// acknowledges it, and the lawyer's notification feed reflects every step.
#[tokio::main]
async fn main() -> counsel_messaging::Result<()> {
    let config = settings::Config::env().unwrap_or_default();
    config.init_logger();

    let core = Core::new(Arc::new(MemoryStore::new()));

    let alice = UserInfo::new(Id::new("u1"), "Alice", None, Role::Client);
    let rao = UserInfo::new(Id::new("l1"), "Advocate Rao", None, Role::Lawyer);

    let room_id = room::resolve(&alice.id, &rao.id)?;
    info!("conversation resolved: {room_id}");

    let (tx, mut feed) = mpsc::unbounded_channel();
    let watch = core
        .notifications
        .start_watching(&rao, move |entries| {
            let _ = tx.send(entries);
        })
        .await?;

    core.messages
        .create(&room_id, &alice, "Need help with a lease")
        .await?;

    let mut lawyer_view = core.subscriptions.subscribe(&room_id, &rao).await?;
    if let Some(snapshot) = lawyer_view.next().await {
        info!("lawyer sees {} message(s)", snapshot.len());
    }

    core.messages
        .create(&room_id, &rao, "Sure, tell me more")
        .await?;

    // the aggregation task delivers the initial (empty) list first; wait for
    // the conversation to show up
    while let Some(entries) = feed.recv().await {
        if entries.is_empty() {
            continue;
        }
        match serde_json::to_string_pretty(&entries) {
            Ok(json) => info!("notification feed:\n{json}"),
            Err(e) => log::error!("could not render notification feed: {e}"),
        }
        break;
    }

    lawyer_view.unsubscribe();
    core.notifications.stop_watching(watch).await;

    Ok(())
}
