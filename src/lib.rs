//! Nexus is a full-screen terminal chat client for a multi-persona AI agent.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns conversations, personas, persistence, configuration and
//!   the streaming generation pipeline.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`commands`] implements slash-command parsing and execution used by the
//!   chat loop.
//! - [`api`] defines the wire payloads exchanged with the generation service.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which initializes logging and dispatches into
//! [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
