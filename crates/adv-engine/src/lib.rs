//! Plays `.adv` adventures.
//!
//! A [`Session`] walks a validated document step by step, applying choice
//! consequences to its [`Store`] and keeping a history to go back through.
//! Sessions save to JSON and resume against the same document.

pub mod config;
pub mod error;
pub mod save;
pub mod session;
pub mod store;

pub use config::EngineConfig;
pub use error::{CorruptSaveError, EngineError, EngineResult, SessionError, SessionResult};
pub use save::{
    SAVE_VERSION, SaveFile, SaveStore, SlotSummary, deserialize_session, serialize_session,
};
pub use session::{HistoryEntry, Outcome, Position, Session, SessionState, Via};
pub use store::Store;
