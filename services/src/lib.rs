//! Small helpers shared by every crate of the workspace.

pub mod retry;
pub mod uuid;
