pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod profile;
pub mod state;
pub mod testing;
pub mod types;

pub use app::app;
