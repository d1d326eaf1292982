pub mod input;
pub mod renderer;

use glyphmap::domain::grid::Coord;

/// Front-end state the engine does not track.
#[derive(Debug, Default)]
pub struct UiState {
    /// Grid cell under the mouse pointer.
    pub hover: Option<Coord>,
    /// Free-text action being typed; `None` when the prompt is closed.
    pub prompt: Option<String>,
    /// Selected row in the open container.
    pub item_cursor: usize,
}
