//! In-memory `/proc` trees for tests and non-Linux hosts.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
pub use scenarios::ELECTRON_BROWSER_PID;
