pub mod compare;
pub mod config;
pub mod extract;
mod format;
pub mod scan;
