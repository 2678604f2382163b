//! Data models

pub mod entry;
pub mod session;

pub use entry::EntryRecord;
pub use session::UserSession;
