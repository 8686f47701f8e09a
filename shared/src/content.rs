use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A location participants can stand in and travel between.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub neighbors: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: String,
    pub count: u32,
}

/// A character template; spawned actors copy their stats from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDef {
    pub id: String,
    pub name: String,
    pub max_hp: i64,
    #[serde(default)]
    pub starting_items: Vec<ItemStack>,
}

/// Read-only domain data consulted by command handlers.
pub trait Content: Send + Sync {
    fn map(&self, id: &str) -> Option<&MapDef>;
    fn character(&self, id: &str) -> Option<&CharacterDef>;
}

#[derive(Deserialize)]
struct ContentDocument {
    #[serde(default)]
    maps: Vec<MapDef>,
    #[serde(default)]
    characters: Vec<CharacterDef>,
}

/// In-memory [`Content`] backed by hash maps.
#[derive(Clone, Debug, Default)]
pub struct StaticContent {
    maps: HashMap<String, MapDef>,
    characters: HashMap<String, CharacterDef>,
}

impl StaticContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{ "maps": [...], "characters": [...] }`.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let document: ContentDocument = serde_json::from_str(text)?;
        let mut content = Self::new();
        for map in document.maps {
            content.add_map(map);
        }
        for character in document.characters {
            content.add_character(character);
        }
        Ok(content)
    }

    pub fn add_map(&mut self, map: MapDef) -> &mut Self {
        self.maps.insert(map.id.clone(), map);
        self
    }

    pub fn add_character(&mut self, character: CharacterDef) -> &mut Self {
        self.characters.insert(character.id.clone(), character);
        self
    }
}

impl Content for StaticContent {
    fn map(&self, id: &str) -> Option<&MapDef> {
        self.maps.get(id)
    }

    fn character(&self, id: &str) -> Option<&CharacterDef> {
        self.characters.get(id)
    }
}
