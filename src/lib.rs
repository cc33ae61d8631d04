//! Mind Chill: a terminal hub of six small arcade games sharing one session
//! engine, score tracking and high-score persistence.

pub mod config;
pub mod error;
pub mod games;
pub mod hub;
pub mod input;
pub mod scheduler;
pub mod scores;
pub mod session;
pub mod surface;
pub mod timers;

pub use error::{HubError, Result};
pub use games::{GameId, GameModule, Step};
pub use session::{GameOverSummary, SessionController, Status};
