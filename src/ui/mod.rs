//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the event loop that maps keys to actions, dispatches
//!   generation streams and applies their events.
//! - [`renderer`] and [`layout`]: frame composition and transcript layout.
//! - [`markdown`]: the message formatter.
//!
//! This layer only presents and captures interaction state; [`crate::core`]
//! owns sessions and generation.

pub mod chat_loop;
pub mod layout;
pub mod markdown;
pub mod renderer;
pub mod theme;
