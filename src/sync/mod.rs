//! Cross-task primitives.
//!
//! Every datum that crosses a task boundary lives in one of these; they are
//! built on `embassy-sync` and are safe to place in `static`s.

pub mod event_group;
pub mod heartbeat;
pub mod mailbox;

pub use event_group::{EventGroup, Pattern};
pub use heartbeat::Heartbeat;
pub use mailbox::Mailbox;
