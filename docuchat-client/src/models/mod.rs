pub mod chat;
pub mod document;
pub mod health;

pub use chat::*;
pub use document::*;
pub use health::*;
