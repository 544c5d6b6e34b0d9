//! HTTP Handlers

mod chapter;
mod comment;
mod ping;
mod story;
mod taxonomy;
mod user;
mod websocket;

pub use chapter::*;
pub use comment::*;
pub use ping::*;
pub use story::*;
pub use taxonomy::*;
pub use user::*;
pub use websocket::*;
