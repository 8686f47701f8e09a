/// Integration tests for two-party interaction invites
/// Invites are sent by guests over the wire; the host records the TTL timer
/// requests that the runtime would act on

use std::time::Duration;

use lobby_host::HostEffect;
use lobby_shared::models::{interactions::ttl_key, Interactions, InviteStatus};
use lobby_test::{assert_converged, TestLobby, FOREST};
use serde_json::json;

fn lobby() -> TestLobby {
    let mut lobby = TestLobby::new();
    lobby.join("p1").join("p2").join("p3");
    lobby.exchange();
    lobby.host.take_effects();
    lobby
}

fn pending_id(lobby: &TestLobby) -> String {
    let state = lobby.host.get::<Interactions>().unwrap();
    state
        .invites
        .iter()
        .find(|invite| invite.is_pending())
        .unwrap()
        .id
        .clone()
}

fn status(lobby: &TestLobby, id: &str) -> InviteStatus {
    let state = lobby.host.get::<Interactions>().unwrap();
    state.invites.iter().find(|invite| invite.id == id).unwrap().status
}

#[test]
fn invite_schedules_its_ttl() {
    let mut lobby = lobby();
    lobby.act("p1", "interact:invite", json!({ "to": "p2", "action": "trade" }));
    let id = pending_id(&lobby);

    let effects = lobby.host.take_effects();
    assert_eq!(effects.len(), 1);
    match &effects[0] {
        HostEffect::Schedule {
            key,
            after,
            kind,
            body,
        } => {
            assert_eq!(key, &ttl_key(&id));
            assert_eq!(*after, Duration::from_millis(30_000));
            assert_eq!(kind, "interact:expire");
            assert_eq!(body, &json!({ "inviteId": id }));
        }
        other => panic!("expected a schedule, got {:?}", other),
    }
    for guest in ["p1", "p2", "p3"] {
        assert_converged!(lobby, guest, Interactions);
    }
}

#[test]
fn only_the_target_accepts() {
    let mut lobby = lobby();
    lobby.act("p1", "interact:invite", json!({ "to": "p2", "action": "trade" }));
    let id = pending_id(&lobby);
    lobby.host.take_effects();

    lobby.act("p3", "interact:accept", json!({ "inviteId": id }));
    lobby.act("p1", "interact:accept", json!({ "inviteId": id }));
    assert_eq!(status(&lobby, &id), InviteStatus::Pending);
    assert!(lobby.host.take_effects().is_empty());

    lobby.act("p2", "interact:accept", json!({ "inviteId": id }));
    assert_eq!(status(&lobby, &id), InviteStatus::Confirmed);
    assert_eq!(
        lobby.host.take_effects(),
        vec![HostEffect::Cancel { key: ttl_key(&id) }]
    );
    assert_converged!(lobby, "p3", Interactions);
}

#[test]
fn participants_and_host_may_cancel() {
    let mut lobby = lobby();
    lobby.act("p1", "interact:invite", json!({ "to": "p2", "action": "trade" }));
    let first = pending_id(&lobby);
    lobby.act("p3", "interact:cancel", json!({ "inviteId": first }));
    assert_eq!(status(&lobby, &first), InviteStatus::Pending);
    lobby.act("p2", "interact:cancel", json!({ "inviteId": first }));
    assert_eq!(status(&lobby, &first), InviteStatus::Cancelled);

    lobby.act("p1", "interact:invite", json!({ "to": "p3", "action": "duel" }));
    let second = pending_id(&lobby);
    lobby
        .host
        .command("interact:cancel", json!({ "inviteId": second }));
    assert_eq!(status(&lobby, &second), InviteStatus::Cancelled);
}

#[test]
fn expiry_is_host_only_and_settles_once() {
    let mut lobby = lobby();
    lobby.act("p1", "interact:invite", json!({ "to": "p2", "action": "trade" }));
    let id = pending_id(&lobby);

    lobby.act("p1", "interact:expire", json!({ "inviteId": id }));
    assert_eq!(status(&lobby, &id), InviteStatus::Pending);

    assert!(lobby
        .host
        .command("interact:expire", json!({ "inviteId": id })));
    assert_eq!(status(&lobby, &id), InviteStatus::Cancelled);
    let revision = lobby.host.revision::<Interactions>().unwrap();

    // a late accept or a second wake-up changes nothing
    lobby.act("p2", "interact:accept", json!({ "inviteId": id }));
    assert!(!lobby
        .host
        .command("interact:expire", json!({ "inviteId": id })));
    assert_eq!(lobby.host.revision::<Interactions>().unwrap(), revision);
}

#[test]
fn one_pending_invite_per_pair() {
    let mut lobby = lobby();
    lobby.act("p1", "interact:invite", json!({ "to": "p2", "action": "trade" }));
    let revision = lobby.host.revision::<Interactions>().unwrap();
    lobby.act("p2", "interact:invite", json!({ "to": "p1", "action": "trade" }));
    assert_eq!(lobby.host.revision::<Interactions>().unwrap(), revision);

    lobby.act("p2", "interact:invite", json!({ "to": "p3", "action": "trade" }));
    assert_eq!(lobby.host.revision::<Interactions>().unwrap(), revision + 1);
}

#[test]
fn invites_need_the_same_map() {
    let mut lobby = lobby();
    lobby
        .host
        .command("world:place", json!({ "participant": "p2", "mapId": FOREST }));
    lobby.act("p1", "interact:invite", json!({ "to": "p2", "action": "trade" }));
    assert!(lobby.host.get::<Interactions>().unwrap().invites.is_empty());
}
