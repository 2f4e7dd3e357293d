mod change;
mod export;
mod setup;
mod user;

pub use change::{Change, FileKind};
pub use user::{User, UserId};
