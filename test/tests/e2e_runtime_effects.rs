/// END-TO-END: the async host runtime
///
/// Timers, narration and stall checks run on tokio's paused clock, so TTLs
/// of many seconds elapse instantly and deterministically.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use lobby_host::{
    Host, HostConfig, HostHandle, HostRuntime, NarrationError, Narrator, NullNarrator,
};
use lobby_shared::{
    models::{self, ChatLog, Interactions, InviteStatus},
    Envelope, ObjectMessage, PeerId, SyncPolicy,
};
use lobby_test::{test_content, LocalChannel, KNIGHT, TAVERN};
use serde_json::json;
use tokio::task::JoinHandle;

const TTL_MS: u64 = 30_000;

struct Bard {
    calls: AtomicUsize,
}

#[async_trait]
impl Narrator for Bard {
    async fn narrate(&self, lines: Vec<String>) -> Result<String, NarrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("The bard sings: {}", lines.join(" ")))
    }
}

struct Mute;

#[async_trait]
impl Narrator for Mute {
    async fn narrate(&self, _lines: Vec<String>) -> Result<String, NarrationError> {
        Err(NarrationError::Failed {
            reason: "lost its voice".to_string(),
        })
    }
}

/// Host with p1 seated in the tavern beside it and spawned as a knight
fn host() -> Host {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = HostConfig {
        policy: SyncPolicy {
            invite_ttl_ms: TTL_MS,
            ..Default::default()
        },
        ..Default::default()
    };
    let registry = Arc::new(models::default_registry().unwrap());
    let mut host = Host::new(config, registry, Arc::new(test_content()));
    host.command("roster:join", json!({ "id": "p1", "name": "P1" }));
    for participant in ["host", "p1"] {
        host.command(
            "world:place",
            json!({ "participant": participant, "mapId": TAVERN }),
        );
    }
    host.command("actors:spawn", json!({ "participant": "p1", "character": KNIGHT }));
    host
}

fn start(narrator: Arc<dyn Narrator>) -> (HostHandle, JoinHandle<Host>) {
    let (runtime, handle) = HostRuntime::new(host(), narrator);
    (handle, tokio::spawn(runtime.run()))
}

async fn invite(handle: &HostHandle) -> (String, InviteStatus, bool) {
    handle
        .inspect(|host| {
            let invite = host.get::<Interactions>().unwrap().invites[0].clone();
            (invite.id, invite.status, invite.expired)
        })
        .await
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn unanswered_invite_expires_after_ttl() {
    let (handle, task) = start(Arc::new(NullNarrator));
    handle
        .command("interact:invite", json!({ "to": "p1", "action": "trade" }))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(TTL_MS - 1)).await;
    let (_, status, _) = invite(&handle).await;
    assert_eq!(status, InviteStatus::Pending);

    tokio::time::sleep(Duration::from_millis(2)).await;
    let (_, status, expired) = invite(&handle).await;
    assert_eq!(status, InviteStatus::Cancelled);
    assert!(expired);

    handle.shutdown().unwrap();
    let host = task.await.unwrap();
    assert_eq!(host.revision::<Interactions>().unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn accepted_invite_never_expires() {
    let (handle, task) = start(Arc::new(NullNarrator));
    let (channel, _probe) = LocalChannel::new();
    handle.connect(PeerId::from("p1"), Box::new(channel)).unwrap();
    handle
        .command("interact:invite", json!({ "to": "p1", "action": "trade" }))
        .unwrap();
    let (invite_id, _, _) = invite(&handle).await;

    let accept = Envelope::lobby("interact:accept", json!({ "inviteId": invite_id }))
        .encode()
        .unwrap();
    handle.message(PeerId::from("p1"), accept).unwrap();
    let (_, status, _) = invite(&handle).await;
    assert_eq!(status, InviteStatus::Confirmed);

    tokio::time::sleep(Duration::from_millis(TTL_MS * 2)).await;
    let (_, status, expired) = invite(&handle).await;
    assert_eq!(status, InviteStatus::Confirmed);
    assert!(!expired);

    handle.shutdown().unwrap();
    let host = task.await.unwrap();
    assert_eq!(host.revision::<Interactions>().unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn narration_lands_in_chat() {
    let bard = Arc::new(Bard {
        calls: AtomicUsize::new(0),
    });
    let (handle, task) = start(bard.clone());
    handle
        .command("actors:hpAdd:request", json!({ "target": "p1", "delta": -5 }))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let entries = handle
        .inspect(|host| host.get::<ChatLog>().unwrap().entries.clone())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].author, None);
    assert!(entries[0].text.starts_with("The bard sings:"));
    assert_eq!(bard.calls.load(Ordering::SeqCst), 1);

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_narration_changes_nothing() {
    let narrators: [Arc<dyn Narrator>; 2] = [Arc::new(Mute), Arc::new(NullNarrator)];
    for narrator in narrators {
        let (handle, task) = start(narrator);
        handle
            .command("actors:hpAdd:request", json!({ "target": "p1", "delta": -5 }))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let (hp, chat_revision) = handle
            .inspect(|host| {
                let hp = host.get::<models::Loadouts>().unwrap().actor("p1").unwrap().hp;
                (hp, host.revision::<ChatLog>().unwrap())
            })
            .await
            .unwrap();
        assert_eq!(hp, 25);
        assert_eq!(chat_revision, 0);

        handle.shutdown().unwrap();
        task.await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_peer_is_resent_a_snapshot() {
    let (handle, task) = start(Arc::new(NullNarrator));
    let (channel, probe) = LocalChannel::new();
    handle.connect(PeerId::from("p1"), Box::new(channel)).unwrap();
    handle
        .command("chat:append:request", json!({ "text": "anyone there?" }))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(probe.deliver().len(), 1);

    // p1 never acks
    tokio::time::sleep(Duration::from_millis(7_000)).await;
    let frames = probe.deliver();
    assert!(frames.iter().any(|frame| {
        let envelope = Envelope::decode(frame).unwrap();
        matches!(
            ObjectMessage::from_envelope(&envelope).unwrap(),
            Some(ObjectMessage::Replace { id, rev: 1, .. }) if id == "chat"
        )
    }));

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn handle_fails_once_the_runtime_stops() {
    let (handle, task) = start(Arc::new(NullNarrator));
    handle.shutdown().unwrap();
    task.await.unwrap();
    assert!(handle.command("ready", json!({ "ready": true })).is_err());
    assert!(handle.inspect(|_| ()).await.is_err());
}
