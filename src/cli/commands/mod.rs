//! Subcommand implementations.

pub mod config;
pub mod fragments;
pub mod init;
pub mod validate;
