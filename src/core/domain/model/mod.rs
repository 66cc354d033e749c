pub mod auth;
pub mod config;
pub mod connection;
pub mod inventory;
pub mod operation;
pub mod target;
pub mod task;
