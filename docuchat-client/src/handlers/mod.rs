pub mod app;
pub mod chat;
pub mod upload;

pub use app::{Screen, SessionController};
pub use chat::{ChatSession, PendingAsk};
pub use upload::{TrackerError, TrackerEvent, UploadTracker, UPLOAD_FALLBACK_ERROR};
