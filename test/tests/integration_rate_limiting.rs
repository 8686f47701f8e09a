/// Integration tests for command rate limiting
/// Floods are dropped per participant without affecting anyone else

use lobby_shared::{models::ChatLog, PolicyError, RateLimitRule, SyncPolicy};
use lobby_test::{assert_converged, TestLobby};
use serde_json::json;

fn chat_count(lobby: &TestLobby, author: &str) -> usize {
    lobby
        .host
        .get::<ChatLog>()
        .unwrap()
        .entries
        .iter()
        .filter(|entry| entry.author.as_deref() == Some(author))
        .count()
}

#[test]
fn chat_flood_is_capped_per_participant() {
    let mut lobby = TestLobby::new();
    lobby.join("p1").join("p2");
    lobby.exchange();

    for n in 0..12 {
        lobby.send("p1", "chat:append:request", json!({ "text": format!("spam {}", n) }));
    }
    lobby.send("p2", "chat:append:request", json!({ "text": "hello" }));
    lobby.exchange();

    assert_eq!(chat_count(&lobby, "p1"), 8);
    assert_eq!(chat_count(&lobby, "p2"), 1);
    assert_converged!(lobby, "p1", ChatLog);
    assert_converged!(lobby, "p2", ChatLog);
}

#[test]
fn host_commands_are_never_limited() {
    let mut lobby = TestLobby::new();
    for n in 0..30 {
        assert!(lobby
            .host
            .command("chat:append:request", json!({ "text": format!("notice {}", n) })));
    }
    assert_eq!(lobby.host.get::<ChatLog>().unwrap().entries.len(), 30);
}

#[test]
fn tuned_policy_applies_immediately() {
    let mut lobby = TestLobby::new();
    lobby.join("p1");
    lobby.exchange();

    lobby.host.update_policy(|policy| {
        policy.rate_limits = vec![RateLimitRule::new(
            "chat",
            &["chat:append:request"],
            2,
            60_000,
        )];
    })
    .unwrap();
    for n in 0..5 {
        lobby.send("p1", "chat:append:request", json!({ "text": format!("msg {}", n) }));
    }
    lobby.exchange();
    assert_eq!(chat_count(&lobby, "p1"), 2);
}

#[test]
fn tuning_through_a_shared_policy_handle_reaches_the_limiter() {
    let mut lobby = TestLobby::new();
    lobby.join("p1");
    lobby.exchange();

    let store = lobby.host.policy().clone();
    store
        .update(|policy| {
            for rule in policy.rate_limits.iter_mut().filter(|rule| rule.bucket == "chat") {
                rule.limit = 50;
            }
        })
        .unwrap();

    for n in 0..12 {
        lobby.send("p1", "chat:append:request", json!({ "text": format!("msg {}", n) }));
    }
    lobby.exchange();
    assert_eq!(chat_count(&lobby, "p1"), 12);
}

#[test]
fn invalid_policy_update_keeps_the_old_policy_and_limits() {
    let mut lobby = TestLobby::new();
    lobby.join("p1");
    lobby.exchange();

    let result = lobby.host.update_policy(|policy| {
        for rule in policy.rate_limits.iter_mut() {
            rule.limit = 0;
        }
    });
    assert!(matches!(result, Err(PolicyError::Invalid { .. })));
    assert_eq!(lobby.host.policy().snapshot(), SyncPolicy::default());

    for n in 0..12 {
        lobby.send("p1", "chat:append:request", json!({ "text": format!("msg {}", n) }));
    }
    lobby.exchange();
    assert_eq!(chat_count(&lobby, "p1"), 8);
}

#[test]
fn snapshot_requests_are_limited() {
    let mut lobby = TestLobby::new();
    lobby.join("p1");
    lobby.exchange();

    // start() already spent 6 of the 20 allowed
    for _ in 0..20 {
        lobby.guest_mut("p1").request("roster").unwrap();
    }
    lobby.deliver_to_host("p1");
    assert_eq!(lobby.probe("p1").deliver().len(), 14);
}
