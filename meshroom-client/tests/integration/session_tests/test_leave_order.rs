use meshroom_client::{ClientConfig, JoinParams, MemoryStore, RoomDeps, RoomSession, join_or_create};
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{
    CallRecorder, RecordingBackend, RecordingConnectionFactory, RecordingMediaSource,
    all_connected, join_room, wait_for,
};

#[tokio::test]
async fn test_leave_tears_down_in_order() {
    init_tracing();

    let store = MemoryStore::new();
    let room = join_or_create(&store, "in-order").await.expect("room");

    let recorder = CallRecorder::new(&store, room.id, "user_a");
    let connections = RecordingConnectionFactory::new(&recorder);
    let a = RoomSession::join(
        JoinParams {
            room_id: room.id,
            participant_id: "user_a".into(),
            display_name: "A".to_string(),
        },
        RoomDeps {
            backend: Arc::new(RecordingBackend::new(&recorder)),
            media: Arc::new(RecordingMediaSource::new(&recorder)),
            connections: Arc::new(connections.clone()),
        },
        &ClientConfig::default(),
    )
    .await
    .expect("A joins");

    let b = join_room(&store, room.id, "user_b", "B").await;
    wait_for(&a, "A connected", |s| all_connected(s, 1))
        .await
        .expect("A connected");
    wait_for(&b.handle, "B connected", |s| all_connected(s, 1))
        .await
        .expect("B connected");
    assert!(recorder.calls().is_empty());

    a.leave().await.expect("leave");

    let calls = recorder.calls();
    assert_eq!(calls.len(), 2, "unexpected teardown calls: {calls:?}");

    // Media already stopped, presence still there, both rooms subscribed.
    let remove = &calls[0];
    assert_eq!(remove.call, "remove_presence");
    assert!(remove.media_stopped);
    assert!(remove.present);
    assert_eq!(remove.subscribers, 2);

    // Presence gone and A unsubscribed before its link closes.
    let close = &calls[1];
    assert_eq!(close.call, "close_link");
    assert!(close.media_stopped);
    assert!(!close.present);
    assert_eq!(close.subscribers, 1);

    assert_eq!(connections.mock().closes_for(b.handle.participant_id()), 1);
}
