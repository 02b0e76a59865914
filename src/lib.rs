pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod ids;
pub mod provinces;
pub mod riddles;
pub mod state;
