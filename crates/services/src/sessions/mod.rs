mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use view::{SessionHistoryItem, SessionHistoryService};
pub use workflow::{PlayedSession, SessionLoopService};
