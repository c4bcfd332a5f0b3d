use chrono::{TimeDelta, Utc};
use meshroom_client::{
    Admission, ClientConfig, ManualClock, MemoryStore, RoomStore, TrackMediaSource, WaitingRoom,
    WaitingRoomConfig,
};
use meshroom_core::{RoomId, SessionStatus};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{MockConnectionFactory, deps};

fn fast_config() -> WaitingRoomConfig {
    WaitingRoomConfig {
        wait_seconds: 120,
        tick_millis: 10,
    }
}

#[tokio::test]
async fn test_ready_at_zero_then_joins_room() {
    init_tracing();

    let store = MemoryStore::new();
    let room_id = RoomId::new();
    let t0 = Utc::now();
    let clock = Arc::new(ManualClock::new(t0));
    let admission = Admission {
        room_id,
        participant_id: "user_a".into(),
        display_name: "A".to_string(),
    };

    let handle = WaitingRoom::enter(
        Arc::new(store.clone()),
        clock.clone(),
        fast_config(),
        admission.clone(),
    )
    .await
    .expect("enter");

    clock.set(t0 + TimeDelta::seconds(119));
    let mut rx = handle.watch();
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.time_remaining == Duration::from_secs(1)),
    )
    .await
    .expect("timeout")
    .expect("alive");
    assert!(!handle.snapshot().is_ready);
    assert_eq!(store.list_waiting(room_id).await.unwrap().len(), 1);

    clock.advance(TimeDelta::seconds(1));
    let admitted = tokio::time::timeout(Duration::from_secs(5), handle.admitted())
        .await
        .expect("timeout");
    assert_eq!(admitted, Some(admission));

    let snapshot = handle.snapshot();
    assert!(snapshot.is_ready);
    assert_eq!(snapshot.time_remaining, Duration::ZERO);
    assert!(store.list_waiting(room_id).await.unwrap().is_empty());
    assert_eq!(
        store.get_session(room_id).await.unwrap().map(|s| s.status),
        Some(SessionStatus::Active)
    );

    let connections = MockConnectionFactory::new();
    let room = handle
        .proceed(
            deps(&store, Arc::new(TrackMediaSource), &connections),
            &ClientConfig::default(),
        )
        .await
        .expect("join after admission");
    assert_eq!(room.participant_id().as_str(), "user_a");
    assert_eq!(store.list_participants(room_id).await.unwrap().len(), 1);
    room.leave().await.expect("leave");
}

#[tokio::test]
async fn test_late_entrant_is_admitted_immediately() {
    init_tracing();

    let store = MemoryStore::new();
    let room_id = RoomId::new();
    let t0 = Utc::now();
    store.create_session(room_id, t0).await.unwrap();

    let handle = WaitingRoom::enter(
        Arc::new(store.clone()),
        Arc::new(ManualClock::new(t0 + TimeDelta::seconds(300))),
        fast_config(),
        Admission {
            room_id,
            participant_id: "user_late".into(),
            display_name: "Late".to_string(),
        },
    )
    .await
    .expect("enter");

    assert_eq!(handle.snapshot().time_remaining, Duration::ZERO);
    let admitted = tokio::time::timeout(Duration::from_secs(5), handle.admitted())
        .await
        .expect("timeout");
    assert!(admitted.is_some());
}
