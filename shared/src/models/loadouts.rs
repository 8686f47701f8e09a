use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    content::ItemStack,
    sync_model::{parse_body, CommandContext, Effect, Outcome, SyncModel},
};

use super::{chat::APPEND_NARRATION_KIND, world::World};

pub const SPAWN_KIND: &str = "actors:spawn";
pub const HP_ADD_KIND: &str = "actors:hpAdd:request";
pub const TRANSFER_KIND: &str = "actors:inventory:transfer:request";

pub const MAX_HP_DELTA: i64 = 20;

/// One participant's character
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSheet {
    /// Owning participant
    pub id: String,
    pub character: String,
    pub name: String,
    pub hp: i64,
    pub max_hp: i64,
    #[serde(default)]
    pub items: Vec<ItemStack>,
}

impl ActorSheet {
    fn count_of(&self, item: &str) -> u32 {
        self.items
            .iter()
            .filter(|stack| stack.item == item)
            .fold(0u32, |total, stack| total.saturating_add(stack.count))
    }

    fn take(&mut self, item: &str, count: u32) {
        let mut remaining = count;
        for stack in self.items.iter_mut().filter(|stack| stack.item == item) {
            let taken = remaining.min(stack.count);
            stack.count -= taken;
            remaining -= taken;
        }
        self.items.retain(|stack| stack.count > 0);
    }

    fn give(&mut self, item: &str, count: u32) {
        match self.items.iter_mut().find(|stack| stack.item == item) {
            Some(stack) => stack.count = stack.count.saturating_add(count),
            None => self.items.push(ItemStack {
                item: item.to_string(),
                count,
            }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutsState {
    pub actors: Vec<ActorSheet>,
}

impl LoadoutsState {
    pub fn actor(&self, id: &str) -> Option<&ActorSheet> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    fn actor_mut(&mut self, id: &str) -> Option<&mut ActorSheet> {
        self.actors.iter_mut().find(|actor| actor.id == id)
    }
}

#[derive(Debug, Deserialize)]
pub struct SpawnBody {
    pub participant: String,
    pub character: String,
}

#[derive(Debug, Deserialize)]
pub struct HpAddBody {
    pub target: String,
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct TransferBody {
    pub from: String,
    pub to: String,
    pub item: String,
    pub count: u32,
}

#[derive(Debug)]
pub enum LoadoutsCommand {
    Spawn(SpawnBody),
    HpAdd(HpAddBody),
    Transfer(TransferBody),
}

/// Character sheets: hit points and inventories.
pub struct Loadouts;

impl SyncModel for Loadouts {
    type State = LoadoutsState;
    type Command = LoadoutsCommand;

    const ID: &'static str = "actors";
    const COMMANDS: &'static [&'static str] = &[SPAWN_KIND, HP_ADD_KIND, TRANSFER_KIND];

    fn initial() -> LoadoutsState {
        LoadoutsState::default()
    }

    fn parse(kind: &str, body: &Value) -> Option<LoadoutsCommand> {
        match kind {
            SPAWN_KIND => parse_body(body).map(LoadoutsCommand::Spawn),
            HP_ADD_KIND => parse_body::<HpAddBody>(body).map(|mut hp_add| {
                hp_add.delta = hp_add.delta.clamp(-MAX_HP_DELTA, MAX_HP_DELTA);
                LoadoutsCommand::HpAdd(hp_add)
            }),
            TRANSFER_KIND => parse_body::<TransferBody>(body)
                .filter(|transfer| transfer.count > 0 && transfer.from != transfer.to)
                .map(LoadoutsCommand::Transfer),
            _ => None,
        }
    }

    fn authorize(ctx: &CommandContext<'_>, _state: &LoadoutsState, command: &LoadoutsCommand) -> bool {
        match command {
            LoadoutsCommand::Spawn(_) => ctx.actor.is_host(),
            LoadoutsCommand::HpAdd(hp_add) => ctx.actor.is_host_or(&hp_add.target),
            LoadoutsCommand::Transfer(transfer) => ctx.actor.is_host_or(&transfer.from),
        }
    }

    fn handle(
        ctx: &CommandContext<'_>,
        state: &LoadoutsState,
        command: LoadoutsCommand,
    ) -> Outcome<LoadoutsState> {
        let mut next = state.clone();
        match command {
            LoadoutsCommand::Spawn(SpawnBody {
                participant,
                character,
            }) => {
                let Some(def) = ctx.content.character(&character) else {
                    return Outcome::unchanged();
                };
                let sheet = ActorSheet {
                    id: participant.clone(),
                    character: def.id.clone(),
                    name: def.name.clone(),
                    hp: def.max_hp,
                    max_hp: def.max_hp,
                    items: def.starting_items.clone(),
                };
                match next.actor_mut(&participant) {
                    Some(existing) => *existing = sheet,
                    None => next.actors.push(sheet),
                }
                Outcome::changed(next)
            }
            LoadoutsCommand::HpAdd(HpAddBody { target, delta }) => {
                let Some(sheet) = next.actor_mut(&target) else {
                    return Outcome::unchanged();
                };
                let before = sheet.hp;
                sheet.hp = sheet.hp.saturating_add(delta).clamp(0, sheet.max_hp.max(0));
                if sheet.hp == before {
                    return Outcome::unchanged();
                }
                let line = if sheet.hp > before {
                    format!("{} recovers {} HP ({}/{}).", sheet.name, sheet.hp - before, sheet.hp, sheet.max_hp)
                } else {
                    format!("{} loses {} HP ({}/{}).", sheet.name, before - sheet.hp, sheet.hp, sheet.max_hp)
                };
                Outcome::changed(next).with_effect(Effect::Narrate {
                    lines: vec![line],
                    reply_kind: APPEND_NARRATION_KIND.to_string(),
                })
            }
            LoadoutsCommand::Transfer(TransferBody {
                from,
                to,
                item,
                count,
            }) => {
                let same_map = ctx
                    .read::<World>()
                    .map(|world| world.same_map(&from, &to))
                    .unwrap_or(false);
                if !same_map || next.actor(&to).is_none() {
                    return Outcome::unchanged();
                }
                match next.actor_mut(&from) {
                    Some(giver) if giver.count_of(&item) >= count => giver.take(&item, count),
                    _ => return Outcome::unchanged(),
                }
                if let Some(receiver) = next.actor_mut(&to) {
                    receiver.give(&item, count);
                }
                Outcome::changed(next)
            }
        }
    }
}
