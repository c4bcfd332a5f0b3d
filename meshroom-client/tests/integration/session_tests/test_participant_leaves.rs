use meshroom_client::{MemoryStore, RoomStore, join_or_create};

use crate::integration::init_tracing;
use crate::utils::{all_connected, join_room, wait_for};

#[tokio::test]
async fn test_remaining_participant_closes_link_once() {
    init_tracing();

    let store = MemoryStore::new();
    let room = join_or_create(&store, "farewell").await.expect("room");

    let a = join_room(&store, room.id, "user_a", "A").await;
    let b = join_room(&store, room.id, "user_b", "B").await;
    wait_for(&b.handle, "B connected", |s| all_connected(s, 1))
        .await
        .expect("connected");

    let a_id = a.handle.participant_id().clone();
    let b_id = b.handle.participant_id().clone();

    a.handle.leave().await.expect("leave");

    let b_view = wait_for(&b.handle, "A gone", |s| s.participants.len() == 1)
        .await
        .expect("B roster");
    assert_eq!(b_view.participants[0].id, b_id);
    assert_eq!(b.connections.closes_for(&a_id), 1);

    assert_eq!(a.connections.closes_for(&b_id), 1);
    assert!(!a.handle.snapshot().is_connected);
    assert!(a.handle.local_stream().is_stopped());

    let rows = store.list_participants(room.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].participant_id, b_id);
    assert_eq!(store.subscriber_count(room.id), 1);
}

#[tokio::test]
async fn test_leave_twice_is_same_as_once() {
    init_tracing();

    let store = MemoryStore::new();
    let room = join_or_create(&store, "twice").await.expect("room");

    let a = join_room(&store, room.id, "user_a", "A").await;
    let b = join_room(&store, room.id, "user_b", "B").await;
    wait_for(&a.handle, "A connected", |s| all_connected(s, 1))
        .await
        .expect("connected");

    let b_id = b.handle.participant_id().clone();
    let clone = a.handle.clone();

    a.handle.leave().await.expect("first leave");
    clone.leave().await.expect("second leave");
    a.handle.leave().await.expect("third leave");

    assert_eq!(a.connections.closes_for(&b_id), 1);
    assert_eq!(store.list_participants(room.id).await.unwrap().len(), 1);
    assert!(matches!(
        a.handle.toggle_audio().await,
        Err(meshroom_client::RoomError::NotConnected)
    ));
}
