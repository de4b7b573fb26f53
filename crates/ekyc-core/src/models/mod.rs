//! Data models for ID cards, face comparison, and configuration.

pub mod config;
pub mod document;
pub mod face;
