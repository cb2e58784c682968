//! HTTP routes + handlers, one file per resource.

pub mod common;
pub mod departments;
pub mod medication;
pub mod system;
pub mod tasks;
pub mod users;
