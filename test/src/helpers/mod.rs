pub mod test_content;
pub mod test_lobby;

pub use test_content::{test_content, FOREST, KNIGHT, TAVERN};
pub use test_lobby::{TestGuest, TestLobby, HOST_ID};
