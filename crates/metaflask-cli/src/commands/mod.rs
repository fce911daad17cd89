//! Command implementations.

mod dump;
mod members;
mod projects;
mod sync;

pub use dump::DumpCommand;
pub use members::MembersCommand;
pub use projects::ProjectsCommand;
pub use sync::SyncCommand;
