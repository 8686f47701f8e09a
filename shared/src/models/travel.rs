use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    policy::TravelCancelPolicy,
    sync_model::{parse_body, CommandContext, Effect, Outcome, SyncModel},
};

use super::{
    chat::APPEND_NARRATION_KIND,
    quorum::{tally, Quorum, VoteStatus},
    roster::Roster,
    world::TRAVEL_UPDATE_KIND,
};

pub const PROPOSE_KIND: &str = "map:travel:propose";
pub const VOTE_KIND: &str = "map:travel:vote";
pub const CANCEL_KIND: &str = "map:travel:cancel";

/// A party travel proposal and its running tally
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelInvite {
    pub invite_id: String,
    pub proposer: String,
    pub target_map_id: Option<String>,
    pub status: VoteStatus,
    pub quorum: Quorum,
    pub yes: u32,
    pub no: u32,
    pub total: u32,
    /// Party members at proposal time; only they may vote
    pub voters: Vec<String>,
    /// Who has voted, and how
    #[serde(default)]
    pub votes: BTreeMap<String, bool>,
}

impl TravelInvite {
    pub fn is_pending(&self) -> bool {
        self.status == VoteStatus::Proposed
    }

    fn may_vote(&self, voter: &str) -> bool {
        self.voters.iter().any(|id| id == voter)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelState {
    pub invite: Option<TravelInvite>,
}

impl TravelState {
    fn pending(&self, invite_id: &str) -> Option<&TravelInvite> {
        self.invite
            .as_ref()
            .filter(|invite| invite.is_pending() && invite.invite_id == invite_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeBody {
    #[serde(default)]
    pub target_map_id: Option<String>,
    #[serde(default)]
    pub quorum: Quorum,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
    pub invite_id: String,
    pub approve: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    pub invite_id: String,
}

#[derive(Debug)]
pub enum TravelCommand {
    Propose(ProposeBody),
    Vote(VoteBody),
    Cancel(CancelBody),
}

/// Consent-gated party travel: `idle -> proposed -> approved | rejected | cancelled`.
pub struct Travel;

impl SyncModel for Travel {
    type State = TravelState;
    type Command = TravelCommand;

    const ID: &'static str = "travel";
    const COMMANDS: &'static [&'static str] = &[PROPOSE_KIND, VOTE_KIND, CANCEL_KIND];

    fn initial() -> TravelState {
        TravelState::default()
    }

    fn parse(kind: &str, body: &Value) -> Option<TravelCommand> {
        match kind {
            PROPOSE_KIND => parse_body(body).map(TravelCommand::Propose),
            VOTE_KIND => parse_body(body).map(TravelCommand::Vote),
            CANCEL_KIND => parse_body(body).map(TravelCommand::Cancel),
            _ => None,
        }
    }

    fn authorize(ctx: &CommandContext<'_>, state: &TravelState, command: &TravelCommand) -> bool {
        let actor = ctx.actor.participant().as_str();
        match command {
            TravelCommand::Propose(_) => {
                ctx.actor.is_host()
                    || ctx
                        .read::<Roster>()
                        .map(|roster| roster.contains(actor))
                        .unwrap_or(false)
            }
            TravelCommand::Vote(vote) => match state.pending(&vote.invite_id) {
                Some(invite) => invite.may_vote(actor),
                None => true,
            },
            TravelCommand::Cancel(cancel) => {
                if ctx.actor.is_host() {
                    return true;
                }
                match (ctx.policy.travel_cancel, state.pending(&cancel.invite_id)) {
                    (TravelCancelPolicy::HostOrProposer, Some(invite)) => invite.proposer == actor,
                    (TravelCancelPolicy::HostOrProposer, None) => true,
                    (TravelCancelPolicy::HostOnly, _) => false,
                }
            }
        }
    }

    fn handle(ctx: &CommandContext<'_>, state: &TravelState, command: TravelCommand) -> Outcome<TravelState> {
        match command {
            TravelCommand::Propose(propose) => handle_propose(ctx, state, propose),
            TravelCommand::Vote(vote) => handle_vote(ctx, state, vote),
            TravelCommand::Cancel(CancelBody { invite_id }) => {
                let Some(invite) = state.pending(&invite_id) else {
                    return Outcome::unchanged();
                };
                let mut invite = invite.clone();
                invite.status = VoteStatus::Cancelled;
                Outcome::changed(TravelState {
                    invite: Some(invite),
                })
            }
        }
    }
}

fn handle_propose(ctx: &CommandContext<'_>, state: &TravelState, propose: ProposeBody) -> Outcome<TravelState> {
    if state.invite.as_ref().is_some_and(TravelInvite::is_pending) {
        return Outcome::unchanged();
    }
    if let Some(map_id) = &propose.target_map_id {
        if ctx.content.map(map_id).is_none() {
            return Outcome::unchanged();
        }
    }
    let voters = ctx.read::<Roster>().map(|roster| roster.ids()).unwrap_or_default();
    if voters.is_empty() {
        return Outcome::unchanged();
    }

    Outcome::changed(TravelState {
        invite: Some(TravelInvite {
            invite_id: ctx.nonce.to_string(),
            proposer: ctx.actor.participant().to_string(),
            target_map_id: propose.target_map_id,
            status: VoteStatus::Proposed,
            quorum: propose.quorum,
            yes: 0,
            no: 0,
            total: voters.len() as u32,
            voters,
            votes: BTreeMap::new(),
        }),
    })
}

fn handle_vote(ctx: &CommandContext<'_>, state: &TravelState, vote: VoteBody) -> Outcome<TravelState> {
    let voter = ctx.actor.participant().as_str();
    let Some(invite) = state.pending(&vote.invite_id) else {
        return Outcome::unchanged();
    };
    if !invite.may_vote(voter) || invite.votes.contains_key(voter) {
        return Outcome::unchanged();
    }

    let mut invite = invite.clone();
    invite.votes.insert(voter.to_string(), vote.approve);
    if vote.approve {
        invite.yes += 1;
    } else {
        invite.no += 1;
    }
    invite.status = tally(invite.quorum, invite.yes, invite.no, invite.total);

    let mut outcome = Outcome::changed(TravelState {
        invite: Some(invite.clone()),
    });
    if invite.status == VoteStatus::Approved {
        let destination = invite
            .target_map_id
            .as_deref()
            .and_then(|map_id| ctx.content.map(map_id));
        if let Some(map) = destination {
            outcome = outcome
                .with_effect(Effect::Dispatch {
                    kind: TRAVEL_UPDATE_KIND.to_string(),
                    body: json!({ "mapId": map.id }),
                })
                .with_effect(Effect::Narrate {
                    lines: vec![format!("The party sets out for {}.", map.name)],
                    reply_kind: APPEND_NARRATION_KIND.to_string(),
                });
        }
    }
    outcome
}
