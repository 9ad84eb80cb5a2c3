pub mod banner;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod prompts;
pub mod provider;
pub mod session;
pub mod spinner;
pub mod story;
