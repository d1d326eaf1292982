pub mod entity;
pub mod glyph;
pub mod grid;
pub mod index;
pub mod location;
pub mod narrative;
