use counsel_messaging::message::Error;
use counsel_messaging::receipt;
use counsel_messaging::room;

mod common;

#[tokio::test]
async fn empty_text_is_rejected_before_any_store_call() {
    let core = common::core();
    let alice = common::client("u1", "Alice");
    let rao = common::lawyer("l1", "Advocate Rao");
    let room_id = common::room_of(&alice, &rao);

    let result = core.messages.create(&room_id, &alice, "   ").await;

    assert!(matches!(result, Err(Error::EmptyMessage)));
    assert!(
        core.messages.find_by_room_id(&room_id).await.unwrap().is_empty(),
        "a rejected send must leave no partial state"
    );
}

#[tokio::test]
async fn unauthenticated_sender_is_rejected() {
    let core = common::core();
    let alice = common::client("u1", "Alice");
    let rao = common::lawyer("l1", "Advocate Rao");
    let room_id = common::room_of(&alice, &rao);

    let nobody = common::client("", "Ghost");
    let result = core.messages.create(&room_id, &nobody, "hello").await;

    assert!(matches!(result, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn append_to_malformed_room_id_is_a_hard_failure() {
    let core = common::core();
    let alice = common::client("u1", "Alice");

    let malformed: room::Id = serde_json::from_str("\"garbage\"").unwrap();
    let result = core.messages.create(&malformed, &alice, "hello").await;

    assert!(matches!(result, Err(Error::NotFound(None))));
}

#[tokio::test]
async fn client_message_starts_unread_and_lawyer_message_starts_read() {
    let core = common::core();
    let alice = common::client("u1", "Alice");
    let rao = common::lawyer("l1", "Advocate Rao");
    let room_id = common::room_of(&alice, &rao);

    let from_client = core
        .messages
        .create(&room_id, &alice, "Need help with a lease")
        .await
        .unwrap();
    let from_lawyer = core
        .messages
        .create(&room_id, &rao, "Sure, tell me more")
        .await
        .unwrap();

    assert!(!from_client.read());
    assert!(from_lawyer.read(), "a lawyer's own message is born read");
}

#[tokio::test]
async fn messages_come_back_in_append_order_and_stay_there() {
    let core = common::core();
    let alice = common::client("u1", "Alice");
    let rao = common::lawyer("l1", "Advocate Rao");
    let room_id = common::room_of(&alice, &rao);

    for i in 0..20 {
        core.messages
            .create(&room_id, &alice, &format!("message {i}"))
            .await
            .unwrap();
    }

    let first_pass = core.messages.find_by_room_id(&room_id).await.unwrap();
    assert_eq!(first_pass.len(), 20);
    for pair in first_pass.windows(2) {
        assert!(
            (pair[0].created_at(), pair[0].seq()) < (pair[1].created_at(), pair[1].seq()),
            "snapshot must be strictly ordered by (created_at, seq)"
        );
    }

    // a later append never reorders previously seen messages
    core.messages.create(&room_id, &rao, "one more").await.unwrap();
    let second_pass = core.messages.find_by_room_id(&room_id).await.unwrap();
    assert_eq!(&second_pass[..20], &first_pass[..]);
}

#[tokio::test]
async fn mark_read_is_idempotent_and_one_directional() {
    let core = common::core();
    let alice = common::client("u1", "Alice");
    let rao = common::lawyer("l1", "Advocate Rao");
    let room_id = common::room_of(&alice, &rao);

    let msg = core
        .messages
        .create(&room_id, &alice, "hello")
        .await
        .unwrap();

    core.receipts.mark_read(&room_id, msg.id(), &rao).await.unwrap();
    core.receipts.mark_read(&room_id, msg.id(), &rao).await.unwrap();

    let messages = core.messages.find_by_room_id(&room_id).await.unwrap();
    assert!(messages[0].read());
}

#[tokio::test]
async fn mark_read_on_unknown_message_is_a_benign_no_op() {
    let core = common::core();
    let alice = common::client("u1", "Alice");
    let rao = common::lawyer("l1", "Advocate Rao");
    let room_id = common::room_of(&alice, &rao);

    let missing = uuid::Uuid::new_v4();
    let result = core.receipts.mark_read(&room_id, &missing, &rao).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn client_may_not_author_a_read_receipt() {
    let core = common::core();
    let alice = common::client("u1", "Alice");
    let rao = common::lawyer("l1", "Advocate Rao");
    let room_id = common::room_of(&alice, &rao);

    let msg = core
        .messages
        .create(&room_id, &alice, "hello")
        .await
        .unwrap();

    let result = core.receipts.mark_read(&room_id, msg.id(), &alice).await;
    assert!(matches!(result, Err(receipt::Error::Forbidden(_))));

    let messages = core.messages.find_by_room_id(&room_id).await.unwrap();
    assert!(!messages[0].read());
}

#[tokio::test]
async fn lawyer_may_not_mark_their_own_message() {
    let core = common::core();
    let alice = common::client("u1", "Alice");
    let rao = common::lawyer("l1", "Advocate Rao");
    let room_id = common::room_of(&alice, &rao);

    let msg = core
        .messages
        .create(&room_id, &alice, "hello")
        .await
        .unwrap();

    // a lawyer-roled session carrying the owner's id is still refused
    let impostor = common::lawyer("u1", "Alice");
    let result = core.receipts.mark_read(&room_id, msg.id(), &impostor).await;

    assert!(matches!(result, Err(receipt::Error::Forbidden(_))));
}
