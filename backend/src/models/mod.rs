pub mod game;

pub use game::{GameMode, GuessRecord, Location, Session, UnknownGameMode};
