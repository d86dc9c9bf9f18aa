//! Demo host around the protocol engine: a TCP accept loop and two
//! handlers.

pub mod handlers;
pub mod listener;

pub use handlers::{HelloHandler, StaticFiles};
