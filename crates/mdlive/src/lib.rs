//! Live collaborative markdown slide decks.
//!
//! Many clients edit one markdown document and watch it render as a slide
//! deck; one presenter navigates and everyone else mirrors the position.
//! The pieces are layered leaf first:
//!
//! - [`parser`] and [`highlight`]: pure text transforms.
//! - [`viewport`]: zoom and pan over a rendered diagram.
//! - [`protocol`] and [`transport`]: wire messages and the connections that carry them.
//! - [`sync`]: the sans-IO document synchronization client.
//! - [`presenter`], [`editor`] and [`session`]: controllers and their glue.
//! - [`runtime`]: the single-threaded event loop that drives a session.

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diagram;
pub mod editor;
pub mod error;
pub mod highlight;
pub mod parser;
pub mod presenter;
pub mod protocol;
pub mod recent;
pub mod runtime;
pub mod session;
pub mod sync;
pub mod transport;
pub mod upload;
pub mod viewport;
