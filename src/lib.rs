pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod handoff;
pub mod lifecycle;
pub mod service;
pub mod validate;
