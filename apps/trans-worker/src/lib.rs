pub mod backend;
pub mod config;
pub mod error;
pub mod prompt;
pub mod service;
