pub mod api;
pub mod auth;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod entities;
pub mod error;
pub mod notifications;
pub mod server;
pub mod store;

pub mod simulation;
