pub mod auth;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod file;
pub mod inventory;
pub mod llm;
pub mod shared;
pub mod tests;
