//! weai is a full-screen terminal client for the WE AI agriculture assistant.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: the conversation session, the socket
//!   transport, the typewriter reveal, the orbit simulation and configuration.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`api`] defines the REST payloads and calls used to start and end
//!   conversations.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which parses arguments and dispatches into
//! [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
