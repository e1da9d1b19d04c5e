//! Lifestyle risk dashboard: a deterministic local risk estimate, a
//! model-written assessment, and a health-assistant chat, stored per user
//! in one JSON file.

pub mod ai_provider;
pub mod cli;
pub mod config;
pub mod core;
pub mod prompt;
pub mod service;
pub mod web;

pub use crate::core::{estimate, extract_score, parse_score};
