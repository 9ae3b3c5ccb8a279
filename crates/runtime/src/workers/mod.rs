//! Worker tasks that back the runtime orchestration.
//!
//! The session worker owns the puzzle session and serialises every request
//! against it, including paced runs.

mod session;

pub use session::{Request, SessionWorker};
