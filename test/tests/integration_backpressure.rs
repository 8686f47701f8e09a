/// Integration tests for per-peer backpressure
/// Congested channels queue in order, overflow drops the oldest frames, and
/// replicas heal through snapshots either way

use std::time::{Duration, Instant};

use lobby_guest::GuestEvent;
use lobby_host::ChannelState;
use lobby_shared::{models::ChatLog, PeerId, SyncPolicy};
use lobby_test::{assert_converged, TestLobby};
use serde_json::json;

fn policy() -> SyncPolicy {
    SyncPolicy {
        queue_threshold_bytes: 1000,
        high_water_factor: 1.0,
        flush_factor: 0.5,
        max_queue: 4,
        ..Default::default()
    }
}

fn seated() -> TestLobby {
    let mut lobby = TestLobby::with_policy(policy());
    lobby.join("p1");
    lobby.exchange();
    lobby.guest_mut("p1").take_events();
    lobby
}

fn say(lobby: &mut TestLobby, n: usize) {
    for i in 0..n {
        lobby
            .host
            .command("chat:append:request", json!({ "text": format!("line {}", i) }));
    }
}

#[test]
fn congested_peer_receives_queued_patches_in_order() {
    let mut lobby = seated();
    let peer = PeerId::from("p1");

    lobby.probe("p1").congest(5000);
    say(&mut lobby, 3);
    assert_eq!(lobby.host.queue_len(&peer), Some(3));
    assert_eq!(lobby.probe("p1").in_flight(), 0);

    lobby.exchange();
    assert_eq!(lobby.host.queue_len(&peer), Some(0));
    assert_converged!(lobby, "p1", ChatLog);

    let revisions: Vec<u64> = lobby
        .guest_mut("p1")
        .take_events()
        .into_iter()
        .map(|event| match event {
            GuestEvent::Patched { rev, .. } => rev,
            other => panic!("expected only patches, got {:?}", other),
        })
        .collect();
    assert_eq!(revisions, vec![1, 2, 3]);
}

#[test]
fn overflow_drops_oldest_and_resyncs() {
    let mut lobby = seated();
    let peer = PeerId::from("p1");

    lobby.probe("p1").congest(5000);
    say(&mut lobby, 6);
    assert_eq!(lobby.host.queue_len(&peer), Some(4));
    assert_eq!(lobby.host.dropped(&peer), Some(2));

    lobby.exchange();
    assert_converged!(lobby, "p1", ChatLog);
    let events = lobby.guest_mut("p1").take_events();
    assert!(events
        .iter()
        .any(|event| matches!(event, GuestEvent::Resync { id, .. } if id == "chat")));
    assert!(events
        .iter()
        .any(|event| matches!(event, GuestEvent::Replaced { id, rev: 6 } if id == "chat")));
}

#[test]
fn closed_channel_drops_and_stall_recovery_heals() {
    let mut lobby = seated();
    let peer = PeerId::from("p1");
    let sent = lobby.probe("p1").sent();

    lobby.probe("p1").set_state(ChannelState::Closed);
    say(&mut lobby, 2);
    assert_eq!(lobby.host.queue_len(&peer), Some(0));
    assert_eq!(lobby.probe("p1").sent(), sent);

    lobby.probe("p1").set_state(ChannelState::Open);
    let later = Instant::now() + Duration::from_millis(policy().patch_stall_timeout_ms + 1);
    assert_eq!(lobby.host.check_stalls(later), 1);

    lobby.exchange();
    assert_converged!(lobby, "p1", ChatLog);
}

#[test]
fn failed_send_is_retried_on_drain() {
    let mut lobby = seated();
    let peer = PeerId::from("p1");

    lobby.probe("p1").fail_sends(true);
    say(&mut lobby, 1);
    assert_eq!(lobby.host.queue_len(&peer), Some(1));

    lobby.probe("p1").fail_sends(false);
    lobby.exchange();
    assert_eq!(lobby.host.queue_len(&peer), Some(0));
    assert_converged!(lobby, "p1", ChatLog);
}
