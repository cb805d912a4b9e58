pub mod backend;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
