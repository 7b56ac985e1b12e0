pub mod config;
pub mod error;
pub mod identity;
pub mod projection;
pub mod security;
pub mod server;
pub mod service;
pub mod storage;
