pub mod calendar;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod options;
pub mod progression;
pub mod question;
pub mod scheduler;
pub mod storage;
pub mod types;

pub use engine::GameEngine;
pub use error::{GameError, Result};
pub use types::{AnswerOutcome, Character, Customization, GameMode, GameStatus, Question};
