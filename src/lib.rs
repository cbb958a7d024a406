pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;
pub mod status;
pub mod validators;
pub mod websocket;
