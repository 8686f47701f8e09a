use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sync_model::{parse_body, CommandContext, Outcome, SyncModel};

use super::roster::Roster;

pub const APPEND_REQUEST_KIND: &str = "chat:append:request";
pub const APPEND_NARRATION_KIND: &str = "chat:append:narration";

pub const MAX_TEXT_CHARS: usize = 500;
pub const MAX_ENTRIES: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub id: String,
    /// `None` for narration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub text: String,
    pub at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatState {
    pub entries: Vec<ChatEntry>,
}

impl ChatState {
    fn has_command(&self, author: &str, command_id: &str) -> bool {
        self.entries.iter().any(|entry| {
            entry.author.as_deref() == Some(author) && entry.command_id.as_deref() == Some(command_id)
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendBody {
    pub text: String,
    #[serde(default)]
    pub command_id: Option<String>,
}

#[derive(Debug)]
pub enum ChatCommand {
    Append(AppendBody),
    Narration(AppendBody),
}

/// The shared chat log, capped to the most recent entries.
///
/// A guest may tag a message with a `commandId`; resubmitting the same id
/// is a no-op so retries never double-post.
pub struct ChatLog;

impl SyncModel for ChatLog {
    type State = ChatState;
    type Command = ChatCommand;

    const ID: &'static str = "chat";
    const COMMANDS: &'static [&'static str] = &[APPEND_REQUEST_KIND, APPEND_NARRATION_KIND];

    fn initial() -> ChatState {
        ChatState::default()
    }

    fn parse(kind: &str, body: &Value) -> Option<ChatCommand> {
        let mut append = parse_body::<AppendBody>(body)?;
        append.text = append.text.trim().to_string();
        let chars = append.text.chars().count();
        if chars == 0 || chars > MAX_TEXT_CHARS {
            return None;
        }
        match kind {
            APPEND_REQUEST_KIND => Some(ChatCommand::Append(append)),
            APPEND_NARRATION_KIND => Some(ChatCommand::Narration(append)),
            _ => None,
        }
    }

    fn authorize(ctx: &CommandContext<'_>, _state: &ChatState, command: &ChatCommand) -> bool {
        match command {
            ChatCommand::Append(_) => {
                ctx.actor.is_host()
                    || ctx
                        .read::<Roster>()
                        .map(|roster| roster.contains(ctx.actor.participant().as_str()))
                        .unwrap_or(false)
            }
            ChatCommand::Narration(_) => ctx.actor.is_host(),
        }
    }

    fn handle(ctx: &CommandContext<'_>, state: &ChatState, command: ChatCommand) -> Outcome<ChatState> {
        let entry = match command {
            ChatCommand::Append(AppendBody { text, command_id }) => {
                let author = ctx.actor.participant().to_string();
                if let Some(command_id) = &command_id {
                    if state.has_command(&author, command_id) {
                        return Outcome::unchanged();
                    }
                }
                ChatEntry {
                    id: ctx.nonce.to_string(),
                    author: Some(author),
                    text,
                    at: ctx.now_ms,
                    command_id,
                }
            }
            ChatCommand::Narration(AppendBody { text, .. }) => ChatEntry {
                id: ctx.nonce.to_string(),
                author: None,
                text,
                at: ctx.now_ms,
                command_id: None,
            },
        };

        let mut next = state.clone();
        next.entries.push(entry);
        if next.entries.len() > MAX_ENTRIES {
            let excess = next.entries.len() - MAX_ENTRIES;
            next.entries.drain(..excess);
        }
        Outcome::changed(next)
    }
}
