//! Ollaterm is a terminal chat client for a locally running Ollama daemon.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns conversation state, model/role selection, configuration,
//!   and streaming orchestration.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that drives user input and display updates.
//! - [`api`] defines the Ollama chat/tags payloads used by the streaming
//!   worker and the model-listing call.
//!
//! The binary entrypoint (`src/main.rs`) parses CLI arguments, loads the
//! configuration, and dispatches into [`ui::chat_loop`] for the interactive
//! session.

pub mod api;
pub mod core;
pub mod ui;
pub mod utils;
