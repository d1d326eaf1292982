/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Screen layout (rows):
///   0            HUD: room, wealth tier, health, turn, status
///   2..2+view_h  map viewport (each grid cell = 2 terminal columns)
///   +1           hover / warning line
///   +3           options or the free-text prompt
///   ...          log, most recent entry at the bottom
///   last         key help
///
/// Colors come from the projected scene's materials, so the terminal view
/// and any other consumer of the scene agree on what each cell is.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use glyphmap::domain::grid::Coord;
use glyphmap::domain::location;
use glyphmap::sim::scene::{floor_palette, Instance, Primitive, Rgb};
use glyphmap::sim::world::{Camera, GameStatus, LogRole, Phase, WorldState};

use super::UiState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so gaps
    /// between rows match the cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column; clipped at the edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

/// Each grid cell = 2 terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MIN_LOG_ROWS: usize = 4;

const HUD_BG: Color = Color::Rgb { r: 40, g: 30, b: 20 };
const HOVER_BG: Color = Color::Rgb { r: 70, g: 70, b: 110 };
const LABEL_FG: Color = Color::Rgb { r: 235, g: 222, b: 180 };
const PLAYER_LOG_FG: Color = Color::Rgb { r: 230, g: 200, b: 90 };
const SYSTEM_LOG_FG: Color = Color::Rgb { r: 200, g: 200, b: 200 };
const DIM_FG: Color = Color::Rgb { r: 110, g: 110, b: 130 };
const WARN_FG: Color = Color::Rgb { r: 230, g: 140, b: 60 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Grid cell under a terminal position, if it shows one.
    pub fn grid_at(&self, world: &WorldState, col: u16, row: u16) -> Option<Coord> {
        screen_to_grid(&world.camera, world.grid.width(), world.grid.height(), col as usize, row as usize)
    }

    pub fn render(&mut self, world: &mut WorldState, ui: &UiState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Viewport: capped to the grid so small maps are not padded with void.
        let option_rows = world.options.len().max(1);
        let reserved = MAP_ROW + 1 + 2 + option_rows + 1 + MIN_LOG_ROWS + 1;
        let view_w = (self.term_w / CELL_W).min(world.grid.width()).max(1);
        let view_h = self.term_h.saturating_sub(reserved).min(world.grid.height()).max(1);
        if (view_w, view_h) != (world.camera.view_w, world.camera.view_h) {
            world.set_viewport(view_w, view_h);
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        self.compose_hud(world);
        self.compose_map(world, ui);
        let below = MAP_ROW + world.camera.view_h + 1;
        self.compose_hover(world, ui, below);
        let log_top = self.compose_options(world, ui, below + 2);
        self.compose_log(world, log_top + 1);
        self.compose_help(world, ui);

        if world.active_container().is_some() {
            self.compose_container(world, ui);
        }
        if world.is_over() {
            self.compose_game_over(world);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, w: &WorldState) {
        let status = match (w.status, w.phase) {
            (GameStatus::Dead, _) => "DEAD",
            (GameStatus::Survived, _) => "SURVIVED",
            (_, Phase::AwaitingTurn) => "…",
            _ => "",
        };
        let hud = format!(
            " {}  │  {}  │  ♥ {:>3}  │  Turn {:<3}  │  Inventory {}  {} ",
            location::room_name(&w.location),
            w.tier.as_str(),
            w.health,
            w.turn,
            w.inventory.len(),
            status,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_map(&mut self, w: &WorldState, ui: &UiState) {
        let (gw, gh) = (w.grid.width(), w.grid.height());
        let floor = floor_palette(w.tier);
        let floor_bg = shade(floor.shade, 0.35);
        let labels = w.grid.label_mask();

        let scene = w.scene.scene();
        let mut lookup: Vec<Option<&Instance>> = vec![None; gw * gh];
        if let Some(s) = scene {
            for inst in &s.instances {
                if inst.at.x < gw && inst.at.y < gh {
                    lookup[inst.at.y * gw + inst.at.x] = Some(inst);
                }
            }
        }
        let color_of = |kind: Primitive| {
            scene.and_then(|s| s.material(kind)).map(|m| m.color).unwrap_or(floor.accent)
        };

        let cam = &w.camera;
        for vy in 0..cam.view_h {
            let row = MAP_ROW + vy;
            if row >= self.front.height { break; }
            for vx in 0..cam.view_w {
                let col = vx * CELL_W;
                if col + 1 >= self.front.width { break; }
                let (wx, wy) = (cam.x + vx as i32, cam.y + vy as i32);
                if wx < 0 || wy < 0 || wx as usize >= gw || wy as usize >= gh {
                    continue;
                }
                let at = Coord::new(wx as usize, wy as usize);
                let ch = w.grid.get(at).unwrap_or(' ');
                let mut bg = floor_bg;
                if ui.hover == Some(at) {
                    bg = HOVER_BG;
                }

                let (c0, c1, fg) = if labels[at.y][at.x] {
                    (ch, ' ', LABEL_FG)
                } else {
                    match lookup[at.y * gw + at.x] {
                        Some(inst) => {
                            let color = color_of(inst.kind);
                            match inst.kind {
                                Primitive::Wall | Primitive::HeavyWall => {
                                    if ui.hover != Some(at) {
                                        bg = shade(color, 0.45);
                                    }
                                    (ch, ch, rgb(color))
                                }
                                _ => (ch, ' ', rgb(color)),
                            }
                        }
                        None => (ch, ' ', rgb(floor.accent)),
                    }
                };
                self.front.set(col, row, Cell::new(c0, fg, bg));
                self.front.set(col + 1, row, Cell::new(c1, fg, bg));
            }
        }
    }

    fn compose_hover(&mut self, w: &WorldState, ui: &UiState, row: usize) {
        let picked = ui
            .hover
            .and_then(|at| w.scene.scene().and_then(|s| s.pick(at)))
            .map(|i| i.hover_text());
        if let Some(text) = picked {
            self.front.put_str(1, row, &format!("◈ {text}"), LABEL_FG, Color::Reset);
        } else if let Some(warn) = w.warnings.last() {
            self.front.put_str(1, row, &format!("⚠ {warn}"), WARN_FG, Color::Reset);
        }
    }

    /// Options list or prompt. Returns the last row used.
    fn compose_options(&mut self, w: &WorldState, ui: &UiState, top: usize) -> usize {
        if let Some(text) = &ui.prompt {
            self.front.put_str(1, top, &format!("Your action: {text}_"), Color::White, Color::Reset);
            return top;
        }
        if w.phase == Phase::AwaitingTurn {
            self.front.put_str(1, top, "The world responds…", DIM_FG, Color::Reset);
            return top;
        }
        let mut row = top;
        for (i, opt) in w.options.iter().take(9).enumerate() {
            let line = format!("[{}] {}", i + 1, opt.text);
            self.front.put_str(1, row, &line, Color::Rgb { r: 120, g: 200, b: 255 }, Color::Reset);
            row += 1;
        }
        row.saturating_sub(1).max(top)
    }

    fn compose_log(&mut self, w: &WorldState, top: usize) {
        let bottom = self.front.height.saturating_sub(2);
        if top > bottom { return; }
        let width = self.front.width.saturating_sub(2).max(1);

        let mut lines: Vec<(String, Color)> = vec![];
        for entry in &w.history {
            if entry.text.is_empty() { continue; }
            let fg = match entry.role {
                LogRole::Player => PLAYER_LOG_FG,
                LogRole::System => SYSTEM_LOG_FG,
            };
            for line in wrap(&entry.text, width) {
                lines.push((line, fg));
            }
        }

        let rows = bottom - top + 1;
        let start = lines.len().saturating_sub(rows);
        for (i, (line, fg)) in lines[start..].iter().enumerate() {
            self.front.put_str(1, top + i, line, *fg, Color::Reset);
        }
    }

    fn compose_help(&mut self, w: &WorldState, ui: &UiState) {
        let Some(row) = self.front.height.checked_sub(1) else { return };
        let help = if w.is_over() {
            " Esc/Q: Quit"
        } else if ui.prompt.is_some() {
            " Enter: Send   Esc: Cancel"
        } else if w.active_container().is_some() {
            " ↑↓: Select   Enter: Take   A: Take all   Esc: Close"
        } else {
            " ←↑↓→/WASD: Move   1-9: Choose   C: Custom action   Mouse: Inspect   Esc: Quit"
        };
        self.front.put_str(0, row, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_container(&mut self, w: &WorldState, ui: &UiState) {
        let Some(c) = w.active_container() else { return };
        let box_bg = Color::Rgb { r: 45, g: 35, b: 28 };
        let box_w = 36_usize.min(self.front.width);
        let box_h = (c.contents.len().max(1) + 4).min(self.front.height.saturating_sub(MAP_ROW));
        let box_x = 2;

        for y in MAP_ROW..MAP_ROW + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, box_bg));
            }
        }
        let title = if c.searched { format!("{} (searched)", c.name) } else { c.name.clone() };
        self.front.put_str(box_x + 1, MAP_ROW, &title, LABEL_FG, box_bg);

        if c.contents.is_empty() {
            self.front.put_str(box_x + 2, MAP_ROW + 2, "(empty)", DIM_FG, box_bg);
            return;
        }
        for (i, item) in c.contents.iter().enumerate() {
            let row = MAP_ROW + 2 + i;
            if row + 1 >= MAP_ROW + box_h { break; }
            let (marker, fg) = if i == ui.item_cursor {
                ("▸", Color::White)
            } else {
                (" ", SYSTEM_LOG_FG)
            };
            self.front.put_str(box_x + 1, row, &format!("{marker} {item}"), fg, box_bg);
        }
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let (banner, color) = match w.status {
            GameStatus::Survived => ("║        ★  YOU SURVIVED  ★        ║", Color::Rgb { r: 255, g: 220, b: 50 }),
            _ => ("║        ✕  YOU HAVE DIED  ✕       ║", Color::Rgb { r: 255, g: 60, b: 60 }),
        };
        let box_art = [
            "╔══════════════════════════════════╗",
            banner,
            "╚══════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, MAP_ROW + 1 + i, l, color, Color::Reset);
        }
        let turns = format!("◈ Turns: {}", w.turn);
        let place = format!("◈ Last seen: {}", w.location);
        self.front.put_str(6, MAP_ROW + 5, &turns, Color::White, Color::Reset);
        self.front.put_str(6, MAP_ROW + 6, &place, Color::White, Color::Reset);
    }
}

// ── Helpers ──

fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

fn shade(c: Rgb, factor: f32) -> Color {
    let f = |v: u8| (f32::from(v) * factor).round().clamp(0.0, 255.0) as u8;
    Color::Rgb { r: f(c.0), g: f(c.1), b: f(c.2) }
}

/// Map a terminal position onto the grid through the camera.
fn screen_to_grid(cam: &Camera, grid_w: usize, grid_h: usize, col: usize, row: usize) -> Option<Coord> {
    if row < MAP_ROW || row >= MAP_ROW + cam.view_h || col >= cam.view_w * CELL_W {
        return None;
    }
    let wx = cam.x + (col / CELL_W) as i32;
    let wy = cam.y + (row - MAP_ROW) as i32;
    if wx < 0 || wy < 0 || wx as usize >= grid_w || wy as usize >= grid_h {
        return None;
    }
    Some(Coord::new(wx as usize, wy as usize))
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = vec![];
    for para in text.lines() {
        let mut line = String::new();
        let mut len = 0;
        for word in para.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();
            while chars.len() > width {
                if len > 0 {
                    lines.push(std::mem::take(&mut line));
                    len = 0;
                }
                lines.push(chars.drain(..width).collect());
            }
            let wlen = chars.len();
            if wlen == 0 { continue; }
            if len > 0 && len + 1 + wlen > width {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            line.extend(chars);
            len += wlen;
        }
        if len > 0 {
            lines.push(line);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_breaks_on_words() {
        assert_eq!(wrap("You step east in the Kitchen.", 12), vec!["You step", "east in the", "Kitchen."]);
    }

    #[test]
    fn wrap_splits_long_words() {
        assert_eq!(wrap("ab abcdefgh", 4), vec!["ab", "abcd", "efgh"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn screen_maps_through_camera() {
        let cam = Camera { x: 3, y: 1, view_w: 10, view_h: 5 };
        assert_eq!(screen_to_grid(&cam, 30, 14, 0, MAP_ROW), Some(Coord::new(3, 1)));
        assert_eq!(screen_to_grid(&cam, 30, 14, 5, MAP_ROW + 2), Some(Coord::new(5, 3)));
        assert_eq!(screen_to_grid(&cam, 30, 14, 5, 0), None);
        assert_eq!(screen_to_grid(&cam, 30, 14, 20, MAP_ROW), None);
    }
}
