/// Integration tests for quorum-gated party travel
/// Votes arrive from guests over the wire; approval moves the whole party

use lobby_shared::{
    models::{Quorum, Travel, VoteStatus, World},
    SyncPolicy, TravelCancelPolicy,
};
use lobby_host::HostEffect;
use lobby_test::{assert_converged, TestLobby, FOREST, HOST_ID, TAVERN};
use serde_json::json;

/// Host plus three guests, all in the tavern
fn party(policy: SyncPolicy) -> TestLobby {
    let mut lobby = TestLobby::with_policy(policy);
    lobby.join("p1").join("p2").join("p3");
    lobby.exchange();
    lobby
}

fn propose(lobby: &mut TestLobby, quorum: Quorum) -> String {
    lobby.act(
        "p1",
        "map:travel:propose",
        json!({ "targetMapId": FOREST, "quorum": quorum }),
    );
    let travel = lobby.guest("p1").get::<Travel>().unwrap();
    travel.invite.unwrap().invite_id
}

fn vote(lobby: &mut TestLobby, voter: &str, invite_id: &str, approve: bool) {
    lobby.act(
        voter,
        "map:travel:vote",
        json!({ "inviteId": invite_id, "approve": approve }),
    );
}

fn status(lobby: &TestLobby) -> VoteStatus {
    lobby.host.get::<Travel>().unwrap().invite.as_ref().unwrap().status
}

#[test]
fn majority_approval_moves_the_party() {
    let mut lobby = party(SyncPolicy::default());
    let invite_id = propose(&mut lobby, Quorum::Majority);
    let invite = lobby.host.get::<Travel>().unwrap().invite.clone().unwrap();
    assert_eq!(invite.total, 4);
    assert_eq!(invite.proposer, "p1");

    vote(&mut lobby, "p1", &invite_id, true);
    vote(&mut lobby, "p2", &invite_id, true);
    assert_eq!(status(&lobby), VoteStatus::Proposed);
    assert_eq!(lobby.host.get::<World>().unwrap().map_of("p1"), Some(TAVERN));

    vote(&mut lobby, "p3", &invite_id, true);
    assert_eq!(status(&lobby), VoteStatus::Approved);

    let world = lobby.host.get::<World>().unwrap();
    for id in [HOST_ID, "p1", "p2", "p3"] {
        assert_eq!(world.map_of(id), Some(FOREST));
    }
    assert!(lobby
        .host
        .take_effects()
        .iter()
        .any(|effect| matches!(effect, HostEffect::Narrate { lines, .. } if lines[0].contains("Dark Forest"))));

    for guest in ["p1", "p2", "p3"] {
        assert_converged!(lobby, guest, Travel);
        assert_converged!(lobby, guest, World);
    }
}

#[test]
fn majority_rejection_at_half() {
    let mut lobby = party(SyncPolicy::default());
    let invite_id = propose(&mut lobby, Quorum::Majority);

    vote(&mut lobby, "p1", &invite_id, true);
    vote(&mut lobby, "p2", &invite_id, false);
    assert_eq!(status(&lobby), VoteStatus::Proposed);
    vote(&mut lobby, "p3", &invite_id, false);
    assert_eq!(status(&lobby), VoteStatus::Rejected);
    assert_eq!(lobby.host.get::<World>().unwrap().map_of("p1"), Some(TAVERN));
}

#[test]
fn unanimous_quorum_needs_everyone() {
    let mut lobby = party(SyncPolicy::default());
    let invite_id = propose(&mut lobby, Quorum::All);

    for voter in ["p1", "p2", "p3"] {
        vote(&mut lobby, voter, &invite_id, true);
    }
    assert_eq!(status(&lobby), VoteStatus::Proposed);

    lobby.host.command(
        "map:travel:vote",
        json!({ "inviteId": invite_id, "approve": false }),
    );
    assert_eq!(status(&lobby), VoteStatus::Rejected);
}

#[test]
fn repeat_and_ineligible_votes_are_ignored() {
    let mut lobby = party(SyncPolicy::default());
    let invite_id = propose(&mut lobby, Quorum::Majority);

    vote(&mut lobby, "p1", &invite_id, true);
    let revision = lobby.host.revision::<Travel>().unwrap();
    vote(&mut lobby, "p1", &invite_id, true);
    vote(&mut lobby, "p1", "not-the-invite", true);
    assert_eq!(lobby.host.revision::<Travel>().unwrap(), revision);

    // joined after the proposal, so not a voter
    lobby.join("p4");
    lobby.exchange();
    vote(&mut lobby, "p4", &invite_id, true);
    let invite = lobby.host.get::<Travel>().unwrap().invite.clone().unwrap();
    assert_eq!(invite.yes, 1);
    assert!(!invite.votes.contains_key("p4"));
}

#[test]
fn second_proposal_waits_for_the_first() {
    let mut lobby = party(SyncPolicy::default());
    let invite_id = propose(&mut lobby, Quorum::Majority);
    let revision = lobby.host.revision::<Travel>().unwrap();

    lobby.act("p2", "map:travel:propose", json!({ "targetMapId": TAVERN }));
    assert_eq!(lobby.host.revision::<Travel>().unwrap(), revision);
    assert_eq!(
        lobby.host.get::<Travel>().unwrap().invite.as_ref().unwrap().invite_id,
        invite_id
    );
}

#[test]
fn host_only_cancel_policy() {
    let policy = SyncPolicy {
        travel_cancel: TravelCancelPolicy::HostOnly,
        ..Default::default()
    };
    let mut lobby = party(policy);
    let invite_id = propose(&mut lobby, Quorum::Majority);

    lobby.act("p1", "map:travel:cancel", json!({ "inviteId": invite_id }));
    assert_eq!(status(&lobby), VoteStatus::Proposed);

    lobby
        .host
        .command("map:travel:cancel", json!({ "inviteId": invite_id }));
    assert_eq!(status(&lobby), VoteStatus::Cancelled);
    lobby.exchange();
    assert_converged!(lobby, "p3", Travel);
}

#[test]
fn proposer_may_cancel_by_default() {
    let mut lobby = party(SyncPolicy::default());
    let invite_id = propose(&mut lobby, Quorum::Majority);

    lobby.act("p2", "map:travel:cancel", json!({ "inviteId": invite_id }));
    assert_eq!(status(&lobby), VoteStatus::Proposed);
    lobby.act("p1", "map:travel:cancel", json!({ "inviteId": invite_id }));
    assert_eq!(status(&lobby), VoteStatus::Cancelled);
}
