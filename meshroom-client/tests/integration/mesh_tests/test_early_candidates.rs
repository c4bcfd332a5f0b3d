use meshroom_client::LinkState;
use meshroom_core::{RoomId, SignalEnvelope, SignalKind};

use crate::integration::init_tracing;
use crate::utils::{MeshPeer, join_all, pump};

#[tokio::test]
async fn test_candidate_before_offer_is_applied_after_it() {
    init_tracing();

    let room_id = RoomId::new();
    let mut peers = vec![MeshPeer::new(room_id, "a", 1), MeshPeer::new(room_id, "b", 2)];
    let (a, b) = (peers[0].id().clone(), peers[1].id().clone());

    let early = SignalEnvelope::addressed(
        room_id,
        b.clone(),
        a.clone(),
        SignalKind::IceCandidate,
        r#"{"candidate":"candidate:early"}"#.to_string(),
    );
    assert!(!peers[0].mesh.on_signal(early).await);
    assert_eq!(peers[0].mesh.link_count(), 0);

    join_all(&mut peers).await;
    pump(room_id, &mut peers).await;

    let applied = peers[0].connections.candidates_for(&b);
    assert!(applied.iter().any(|c| c.contains("candidate:early")));
    assert_eq!(
        peers[0].mesh.link(&b).map(|l| l.state()),
        Some(LinkState::Connected)
    );
}

#[tokio::test]
async fn test_buffered_candidates_of_departed_peer_are_dropped() {
    init_tracing();

    let room_id = RoomId::new();
    let mut peers = vec![MeshPeer::new(room_id, "a", 1), MeshPeer::new(room_id, "b", 2)];
    let (a, b) = (peers[0].id().clone(), peers[1].id().clone());

    let stale = SignalEnvelope::addressed(
        room_id,
        b.clone(),
        a.clone(),
        SignalKind::IceCandidate,
        r#"{"candidate":"candidate:stale"}"#.to_string(),
    );
    peers[0].mesh.on_signal(stale.clone()).await;
    assert_eq!(peers[0].mesh.buffered_candidates(), 1);

    peers[0].mesh.on_participant_left(&b).await;
    assert_eq!(peers[0].mesh.buffered_candidates(), 0);

    for _ in 0..3 {
        assert!(!peers[0].mesh.on_signal(stale.clone()).await);
    }
    assert_eq!(peers[0].mesh.buffered_candidates(), 0);
    assert!(peers[0].connections.candidates_for(&b).is_empty());
}
