// src/lib.rs

#[macro_use]
pub mod macros;

pub mod cli;
pub mod config;
pub mod core;
pub mod fetch;
pub mod file;
pub mod log;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod specs;
pub mod store;
