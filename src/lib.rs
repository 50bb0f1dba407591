pub mod agent;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod session;
pub mod types;
