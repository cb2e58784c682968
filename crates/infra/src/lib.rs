//! Infrastructure layer: configuration, persistence, the remote inventory
//! client and the application services wired on top of them.

pub mod config;
pub mod db;
pub mod inventory_client;
pub mod repositories;
pub mod services;
