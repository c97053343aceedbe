pub mod config;
pub mod error;
pub mod hosts;
pub mod models;
pub mod network;
