use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sync_model::{parse_body, CommandContext, Outcome, SyncModel};

pub const READY_KIND: &str = "ready";
pub const JOIN_KIND: &str = "roster:join";
pub const LEAVE_KIND: &str = "roster:leave";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub host: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterState {
    pub members: Vec<Member>,
}

impl RosterState {
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.member(id).is_some()
    }

    pub fn ids(&self) -> Vec<String> {
        self.members.iter().map(|member| member.id.clone()).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ReadyBody {
    pub ready: bool,
}

#[derive(Debug, Deserialize)]
pub struct JoinBody {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub host: bool,
}

#[derive(Debug, Deserialize)]
pub struct LeaveBody {
    pub id: String,
}

#[derive(Debug)]
pub enum RosterCommand {
    Ready(ReadyBody),
    Join(JoinBody),
    Leave(LeaveBody),
}

/// Who is in the lobby and whether they are ready.
pub struct Roster;

impl SyncModel for Roster {
    type State = RosterState;
    type Command = RosterCommand;

    const ID: &'static str = "roster";
    const COMMANDS: &'static [&'static str] = &[READY_KIND, JOIN_KIND, LEAVE_KIND];

    fn initial() -> RosterState {
        RosterState::default()
    }

    fn parse(kind: &str, body: &Value) -> Option<RosterCommand> {
        match kind {
            READY_KIND => parse_body(body).map(RosterCommand::Ready),
            JOIN_KIND => parse_body::<JoinBody>(body)
                .filter(|join| !join.id.is_empty() && !join.name.trim().is_empty())
                .map(RosterCommand::Join),
            LEAVE_KIND => parse_body(body).map(RosterCommand::Leave),
            _ => None,
        }
    }

    fn authorize(ctx: &CommandContext<'_>, state: &RosterState, command: &RosterCommand) -> bool {
        match command {
            RosterCommand::Ready(_) => state.contains(ctx.actor.participant().as_str()),
            RosterCommand::Join(_) | RosterCommand::Leave(_) => ctx.actor.is_host(),
        }
    }

    fn handle(
        ctx: &CommandContext<'_>,
        state: &RosterState,
        command: RosterCommand,
    ) -> Outcome<RosterState> {
        let mut next = state.clone();
        match command {
            RosterCommand::Ready(ReadyBody { ready }) => {
                let id = ctx.actor.participant().as_str();
                if let Some(member) = next.members.iter_mut().find(|member| member.id == id) {
                    member.ready = ready;
                }
            }
            RosterCommand::Join(JoinBody { id, name, host }) => {
                match next.members.iter_mut().find(|member| member.id == id) {
                    Some(member) => member.name = name,
                    None => next.members.push(Member {
                        id,
                        name,
                        ready: false,
                        host,
                    }),
                }
            }
            RosterCommand::Leave(LeaveBody { id }) => {
                next.members.retain(|member| member.id != id);
            }
        }
        Outcome::changed(next)
    }
}
