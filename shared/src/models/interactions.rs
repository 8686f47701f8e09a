use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::sync_model::{parse_body, CommandContext, Effect, Outcome, SyncModel};

use super::{roster::Roster, world::World};

pub const INVITE_KIND: &str = "interact:invite";
pub const ACCEPT_KIND: &str = "interact:accept";
pub const CANCEL_KIND: &str = "interact:cancel";
pub const EXPIRE_KIND: &str = "interact:expire";

/// Settled invites kept for display; older ones are pruned
pub const SETTLED_KEPT: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: String,
    pub from: String,
    pub to: String,
    pub action: String,
    pub status: InviteStatus,
    pub created_at: u64,
    /// Set when the TTL ran out before an answer
    #[serde(default)]
    pub expired: bool,
}

impl Invite {
    pub fn is_pending(&self) -> bool {
        self.status == InviteStatus::Pending
    }

    fn involves(&self, participant: &str) -> bool {
        self.from == participant || self.to == participant
    }

    fn between(&self, a: &str, b: &str) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionsState {
    pub invites: Vec<Invite>,
}

impl InteractionsState {
    pub fn invite(&self, id: &str) -> Option<&Invite> {
        self.invites.iter().find(|invite| invite.id == id)
    }

    fn pending(&self, id: &str) -> Option<&Invite> {
        self.invite(id).filter(|invite| invite.is_pending())
    }

    fn settle(&self, id: &str, status: InviteStatus, expired: bool) -> Option<Self> {
        self.pending(id)?;
        let mut next = self.clone();
        for invite in next.invites.iter_mut().filter(|invite| invite.id == id) {
            invite.status = status;
            invite.expired = expired;
        }
        Some(next)
    }

    fn prune_settled(&mut self) {
        let settled = self.invites.iter().filter(|invite| !invite.is_pending()).count();
        let mut excess = settled.saturating_sub(SETTLED_KEPT);
        self.invites.retain(|invite| {
            if excess > 0 && !invite.is_pending() {
                excess -= 1;
                return false;
            }
            true
        });
    }
}

/// Key of the TTL timer guarding an invite
pub fn ttl_key(invite_id: &str) -> String {
    format!("interact:ttl:{}", invite_id)
}

#[derive(Debug, Deserialize)]
pub struct InviteBody {
    pub to: String,
    pub action: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRef {
    pub invite_id: String,
}

#[derive(Debug)]
pub enum InteractionsCommand {
    Invite(InviteBody),
    Accept(InviteRef),
    Cancel(InviteRef),
    Expire(InviteRef),
}

/// Two-party invites: `pending -> confirmed | cancelled`, with a TTL that
/// cancels an unanswered invite.
pub struct Interactions;

impl SyncModel for Interactions {
    type State = InteractionsState;
    type Command = InteractionsCommand;

    const ID: &'static str = "interact";
    const COMMANDS: &'static [&'static str] = &[INVITE_KIND, ACCEPT_KIND, CANCEL_KIND, EXPIRE_KIND];

    fn initial() -> InteractionsState {
        InteractionsState::default()
    }

    fn parse(kind: &str, body: &Value) -> Option<InteractionsCommand> {
        match kind {
            INVITE_KIND => parse_body::<InviteBody>(body)
                .filter(|invite| !invite.to.is_empty() && !invite.action.trim().is_empty())
                .map(InteractionsCommand::Invite),
            ACCEPT_KIND => parse_body(body).map(InteractionsCommand::Accept),
            CANCEL_KIND => parse_body(body).map(InteractionsCommand::Cancel),
            EXPIRE_KIND => parse_body(body).map(InteractionsCommand::Expire),
            _ => None,
        }
    }

    fn authorize(
        ctx: &CommandContext<'_>,
        state: &InteractionsState,
        command: &InteractionsCommand,
    ) -> bool {
        let actor = ctx.actor.participant().as_str();
        match command {
            InteractionsCommand::Invite(_) => true,
            InteractionsCommand::Accept(InviteRef { invite_id }) => state
                .invite(invite_id)
                .map(|invite| invite.to == actor)
                .unwrap_or(true),
            InteractionsCommand::Cancel(InviteRef { invite_id }) => {
                ctx.actor.is_host()
                    || state
                        .invite(invite_id)
                        .map(|invite| invite.involves(actor))
                        .unwrap_or(true)
            }
            InteractionsCommand::Expire(_) => ctx.actor.is_host(),
        }
    }

    fn handle(
        ctx: &CommandContext<'_>,
        state: &InteractionsState,
        command: InteractionsCommand,
    ) -> Outcome<InteractionsState> {
        match command {
            InteractionsCommand::Invite(invite) => handle_invite(ctx, state, invite),
            InteractionsCommand::Accept(InviteRef { invite_id }) => {
                settle_and_cancel_timer(state, &invite_id, InviteStatus::Confirmed)
            }
            InteractionsCommand::Cancel(InviteRef { invite_id }) => {
                settle_and_cancel_timer(state, &invite_id, InviteStatus::Cancelled)
            }
            InteractionsCommand::Expire(InviteRef { invite_id }) => {
                match state.settle(&invite_id, InviteStatus::Cancelled, true) {
                    Some(next) => Outcome::changed(next),
                    None => Outcome::unchanged(),
                }
            }
        }
    }
}

fn settle_and_cancel_timer(
    state: &InteractionsState,
    invite_id: &str,
    status: InviteStatus,
) -> Outcome<InteractionsState> {
    match state.settle(invite_id, status, false) {
        Some(next) => Outcome::changed(next).with_effect(Effect::Cancel {
            key: ttl_key(invite_id),
        }),
        None => Outcome::unchanged(),
    }
}

fn handle_invite(
    ctx: &CommandContext<'_>,
    state: &InteractionsState,
    InviteBody { to, action }: InviteBody,
) -> Outcome<InteractionsState> {
    let from = ctx.actor.participant().as_str();
    if from == to {
        return Outcome::unchanged();
    }
    let on_roster = ctx
        .read::<Roster>()
        .map(|roster| roster.contains(from) && roster.contains(&to))
        .unwrap_or(false);
    let same_map = ctx
        .read::<World>()
        .map(|world| world.same_map(from, &to))
        .unwrap_or(false);
    if !on_roster || !same_map {
        return Outcome::unchanged();
    }
    if state
        .invites
        .iter()
        .any(|invite| invite.is_pending() && invite.between(from, &to))
    {
        return Outcome::unchanged();
    }

    let id = ctx.nonce.to_string();
    let mut next = state.clone();
    next.prune_settled();
    next.invites.push(Invite {
        id: id.clone(),
        from: from.to_string(),
        to,
        action: action.trim().to_string(),
        status: InviteStatus::Pending,
        created_at: ctx.now_ms,
        expired: false,
    });

    Outcome::changed(next).with_effect(Effect::Schedule {
        key: ttl_key(&id),
        after: ctx.policy.invite_ttl(),
        kind: EXPIRE_KIND.to_string(),
        body: json!({ "inviteId": id }),
    })
}
