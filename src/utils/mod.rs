//! Utility modules shared by the build engine.

pub mod exec;
pub mod slug;
