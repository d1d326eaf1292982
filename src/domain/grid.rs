/// Grid: rectangular character storage shared by every consumer.
///
/// Rows are `Vec<char>` (not byte strings) so multi-byte glyphs such as
/// '▓' or '►' occupy exactly one cell. All mutation goes through `set()`,
/// which ignores out-of-bounds writes.

use std::fmt;

use super::glyph::{LABEL_CLOSE, LABEL_OPEN};

/// Zero-indexed cell coordinate, origin top-left.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Coord { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Cardinal step direction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl Direction {
    /// Neighbor scan order used by proximity checks.
    pub const NEIGHBOR_ORDER: [Direction; 4] =
        [Direction::East, Direction::West, Direction::South, Direction::North];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        match (dx, dy) {
            (0, -1) => Some(Direction::North),
            (0, 1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            (1, 0) => Some(Direction::East),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::West => "west",
            Direction::East => "east",
        }
    }
}

/// A `[...]` run on a single row. `start` and `end` are the bracket columns.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LabelSpan {
    pub y: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl LabelSpan {
    pub fn contains(&self, x: usize) -> bool {
        x >= self.start && x <= self.end
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Grid {
    rows: Vec<Vec<char>>,
    width: usize,
}

impl Grid {
    /// Build from rows, padding short rows with spaces.
    pub fn from_rows(mut rows: Vec<Vec<char>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, ' ');
        }
        Grid { rows, width }
    }

    /// Split text on '\n' without any repair beyond padding.
    pub fn parse(text: &str) -> Self {
        Self::from_rows(text.split('\n').map(|l| l.chars().collect()).collect())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<char>] {
        &self.rows
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height()
    }

    #[inline]
    pub fn get(&self, at: Coord) -> Option<char> {
        self.rows.get(at.y).and_then(|r| r.get(at.x)).copied()
    }

    #[inline]
    pub fn set(&mut self, at: Coord, ch: char) {
        if let Some(cell) = self.rows.get_mut(at.y).and_then(|r| r.get_mut(at.x)) {
            *cell = ch;
        }
    }

    /// Neighbor of `at` one step in `dir`, if inside the grid.
    pub fn step(&self, at: Coord, dir: Direction) -> Option<Coord> {
        let (dx, dy) = dir.delta();
        let nx = at.x as i64 + dx as i64;
        let ny = at.y as i64 + dy as i64;
        if self.in_bounds(nx, ny) {
            Some(Coord::new(nx as usize, ny as usize))
        } else {
            None
        }
    }

    /// First occurrence of `ch` in row-major order.
    pub fn find(&self, ch: char) -> Option<Coord> {
        self.cells().find(|&(_, c)| c == ch).map(|(at, _)| at)
    }

    pub fn count(&self, ch: char) -> usize {
        self.cells().filter(|&(_, c)| c == ch).count()
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, char)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, &c)| (Coord::new(x, y), c))
        })
    }

    pub fn row_text(&self, y: usize) -> String {
        self.rows.get(y).map(|r| r.iter().collect()).unwrap_or_default()
    }

    /// Label spans of one row, in column order.
    pub fn row_labels(&self, y: usize) -> Vec<LabelSpan> {
        match self.rows.get(y) {
            Some(row) => label_spans(row, y),
            None => vec![],
        }
    }

    /// Per-cell mask: `true` where the cell belongs to a label span.
    pub fn label_mask(&self) -> Vec<Vec<bool>> {
        let mut mask = vec![vec![false; self.width]; self.height()];
        for (y, row) in self.rows.iter().enumerate() {
            for span in label_spans(row, y) {
                for x in span.start..=span.end {
                    mask[y][x] = true;
                }
            }
        }
        mask
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (y, row) in self.rows.iter().enumerate() {
            if y > 0 {
                f.write_str("\n")?;
            }
            for c in row {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// Non-greedy `[`…`]` detection: each `[` pairs with the next `]` after it.
/// An unclosed `[` ends the scan.
pub fn label_spans(row: &[char], y: usize) -> Vec<LabelSpan> {
    let mut spans = vec![];
    let mut x = 0;
    while x < row.len() {
        if row[x] != LABEL_OPEN {
            x += 1;
            continue;
        }
        let close = match row[x + 1..].iter().position(|&c| c == LABEL_CLOSE) {
            Some(off) => x + 1 + off,
            None => break,
        };
        let text: String = row[x + 1..close].iter().collect();
        spans.push(LabelSpan { y, start: x, end: close, text: text.trim().to_string() });
        x = close + 1;
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_pads_to_rectangle() {
        let g = Grid::parse("ab\nabcd\n");
        assert_eq!(g.width(), 4);
        assert_eq!(g.height(), 3);
        assert!(g.rows().iter().all(|r| r.len() == 4));
    }

    #[test]
    fn multibyte_glyphs_take_one_cell() {
        let g = Grid::parse("▓▓►@");
        assert_eq!(g.width(), 4);
        assert_eq!(g.find('@'), Some(Coord::new(3, 0)));
    }

    #[test]
    fn set_out_of_bounds_is_ignored() {
        let mut g = Grid::parse("..");
        g.set(Coord::new(5, 5), '#');
        assert_eq!(g.to_string(), "..");
    }

    #[test]
    fn step_stops_at_edges() {
        let g = Grid::parse("..\n..");
        assert_eq!(g.step(Coord::new(0, 0), Direction::West), None);
        assert_eq!(g.step(Coord::new(0, 0), Direction::South), Some(Coord::new(0, 1)));
        assert_eq!(g.step(Coord::new(1, 1), Direction::East), None);
    }

    #[test]
    fn label_spans_are_non_greedy() {
        let row: Vec<char> = "▲[HALL] ..[A[B] [open".chars().collect();
        let spans = label_spans(&row, 0);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "HALL");
        assert_eq!((spans[0].start, spans[0].end), (1, 6));
        assert_eq!(spans[1].text, "A[B");
    }

    #[test]
    fn label_mask_marks_bracket_runs() {
        let g = Grid::parse("A[BC]D");
        let mask = g.label_mask();
        assert_eq!(mask[0], vec![false, true, true, true, true, false]);
    }

    #[test]
    fn direction_round_trips_deltas() {
        for dir in Direction::NEIGHBOR_ORDER {
            let (dx, dy) = dir.delta();
            assert_eq!(Direction::from_delta(dx, dy), Some(dir));
        }
        assert_eq!(Direction::from_delta(1, 1), None);
    }
}
