pub mod client;
pub mod contacts;
pub mod error;
pub mod grouping;
pub mod models;
pub mod server;
pub mod store;
pub mod ui;

// Re-export main types for convenience
pub use client::ChatApi;
pub use error::{ChatError, ChatResult};
pub use grouping::{group, group_in, DateGroup, SenderRun, Side};
pub use models::*;
pub use store::{MemoryStore, MessageStore};
