pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod output;
pub mod types;
