use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sync_model::{parse_body, CommandContext, Outcome, SyncModel};

use super::roster::Roster;

pub const PLACE_KIND: &str = "world:place";
pub const TRAVEL_UPDATE_KIND: &str = "map:travel:update";

/// Which map every participant is standing in
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldState {
    pub positions: BTreeMap<String, String>,
}

impl WorldState {
    pub fn map_of(&self, participant: &str) -> Option<&str> {
        self.positions.get(participant).map(String::as_str)
    }

    /// True if both participants are placed, and on the same map
    pub fn same_map(&self, a: &str, b: &str) -> bool {
        match (self.map_of(a), self.map_of(b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBody {
    pub participant: String,
    pub map_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelUpdateBody {
    pub map_id: String,
}

#[derive(Debug)]
pub enum WorldCommand {
    Place(PlaceBody),
    TravelUpdate(TravelUpdateBody),
}

pub struct World;

impl SyncModel for World {
    type State = WorldState;
    type Command = WorldCommand;

    const ID: &'static str = "world";
    const COMMANDS: &'static [&'static str] = &[PLACE_KIND, TRAVEL_UPDATE_KIND];

    fn initial() -> WorldState {
        WorldState::default()
    }

    fn parse(kind: &str, body: &Value) -> Option<WorldCommand> {
        match kind {
            PLACE_KIND => parse_body(body).map(WorldCommand::Place),
            TRAVEL_UPDATE_KIND => parse_body(body).map(WorldCommand::TravelUpdate),
            _ => None,
        }
    }

    fn authorize(ctx: &CommandContext<'_>, _state: &WorldState, _command: &WorldCommand) -> bool {
        ctx.actor.is_host()
    }

    fn handle(ctx: &CommandContext<'_>, state: &WorldState, command: WorldCommand) -> Outcome<WorldState> {
        let mut next = state.clone();
        match command {
            WorldCommand::Place(PlaceBody { participant, map_id }) => {
                if ctx.content.map(&map_id).is_none() {
                    return Outcome::unchanged();
                }
                next.positions.insert(participant, map_id);
            }
            WorldCommand::TravelUpdate(TravelUpdateBody { map_id }) => {
                if ctx.content.map(&map_id).is_none() {
                    return Outcome::unchanged();
                }
                let party = match ctx.read::<Roster>() {
                    Some(roster) => roster.ids(),
                    None => state.positions.keys().cloned().collect(),
                };
                for participant in party {
                    next.positions.insert(participant, map_id.clone());
                }
            }
        }
        Outcome::changed(next)
    }
}
