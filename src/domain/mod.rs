//! Pure text and geometry types shared by the renderer and the HTTP layer.

pub mod error;
pub mod layout;
pub mod sanitize;
pub mod theme;
