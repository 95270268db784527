//! Terminal UI layer.
//!
//! - [`chat_loop`]: the event loop that turns key presses and socket events
//!   into [`crate::core::app::AppAction`]s and redraws every frame.
//! - [`renderer`]: composes the backdrop and the chat panel.
//! - [`backdrop`] and [`transcript`]: the particle canvas and transcript layout.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns conversation state and backend coordination.

pub mod backdrop;
pub mod chat_loop;
pub mod renderer;
pub mod transcript;
