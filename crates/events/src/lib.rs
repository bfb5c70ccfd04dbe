//! Courseware notice bus.
//!
//! - [`NoticeBus`]: in-process publish/subscribe hub for user-facing
//!   notices, backed by `tokio::sync::broadcast`.
//! - [`Notice`]: a leveled message, optionally tied to a tree node.

pub mod bus;

pub use bus::{Notice, NoticeBus, NoticeLevel};
