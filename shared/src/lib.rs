//! Shared types, errors, configuration and text helpers for Chatlog.
pub mod config;
pub mod emote;
pub mod errors;
pub mod export;
pub mod models;
pub mod search;
pub mod timefmt;
