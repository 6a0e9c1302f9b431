//! The single user management screen and its HTML rendering.

pub mod render;
pub mod screen;

pub use render::UsersPage;
pub use screen::{Draft, UserScreen};
