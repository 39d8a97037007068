//! Pi-hole Common - Shared configuration, snapshot and view types

pub mod config;
pub mod messages;
pub mod snapshot;
pub mod view;

pub use config::*;
pub use messages::*;
pub use snapshot::*;
pub use view::*;
