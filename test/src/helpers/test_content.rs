use lobby_shared::{CharacterDef, ItemStack, MapDef, StaticContent};

pub const TAVERN: &str = "tavern";
pub const FOREST: &str = "forest";
pub const KNIGHT: &str = "knight";

/// Two connected maps and one playable character
pub fn test_content() -> StaticContent {
    let mut content = StaticContent::new();
    content
        .add_map(MapDef {
            id: TAVERN.to_string(),
            name: "The Tavern".to_string(),
            neighbors: vec![FOREST.to_string()],
        })
        .add_map(MapDef {
            id: FOREST.to_string(),
            name: "Dark Forest".to_string(),
            neighbors: vec![TAVERN.to_string()],
        })
        .add_character(CharacterDef {
            id: KNIGHT.to_string(),
            name: "Knight".to_string(),
            max_hp: 30,
            starting_items: vec![ItemStack {
                item: "potion".to_string(),
                count: 3,
            }],
        });
    content
}
