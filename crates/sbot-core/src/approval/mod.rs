//! Approval state: records, the store port, and the admin commands that change them.

pub mod command;
pub mod model;
pub mod store;

pub use command::{AdminCommand, CommandError};
pub use model::{ApprovalUpdate, UserApproval};
pub use store::{ApprovalStore, InMemoryApprovalStore};
