pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod logging;
pub mod matcher;
pub mod notification;
pub mod scheduler;
pub mod scheme;
pub mod session;
pub mod state;
pub use engine::{EngineOptions, ThemeEngine};
pub use error::{AppError, AppResult};
