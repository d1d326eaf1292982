/// Grid normalizer: turns untrusted map text into a valid bounded grid.
///
/// ## Repair pipeline (order matters):
///   1. Line endings (`\r\n`, lone `\r`) → `\n`; blank edge rows dropped
///   2. Nothing left → 20×10 fallback room
///   3. Ragged rows padded to the widest row
///   4. Oversize (> 30×14) → window cropped around the first `@`,
///      blank edge rows of the window dropped again
///   5. Marker repair: none → injected at center; several → first kept
///
/// The result always satisfies: rectangular, 1..=30 columns,
/// 1..=14 rows, exactly one `@`. Every repair adds a warning; no input
/// makes this fail. Normalizing a normalized grid is the identity.

use crate::domain::glyph::{GlyphClass, PLAYER};
use crate::domain::grid::{Coord, Grid};

pub const MAX_COLS: usize = 30;
pub const MAX_ROWS: usize = 14;

const FALLBACK_COLS: usize = 20;
const FALLBACK_ROWS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedMap {
    pub grid: Grid,
    pub warnings: Vec<String>,
    /// Top-left of the crop window in source coordinates; (0,0) if uncropped.
    pub offset: Coord,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

pub fn normalize(raw: &str) -> NormalizedMap {
    let mut warnings = vec![];

    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let mut rows: Vec<Vec<char>> = text.split('\n').map(|l| l.chars().collect()).collect();
    strip_blank_edges(&mut rows);

    if rows.is_empty() {
        return fallback("Map data missing; generated fallback.");
    }

    let mut grid = Grid::from_rows(rows);
    let mut offset = Coord::default();

    if grid.width() > MAX_COLS || grid.height() > MAX_ROWS {
        let (w, h) = (grid.width(), grid.height());
        let marker = grid.find(PLAYER);
        let origin = Coord::new(
            crop_origin(marker.map(|p| p.x), w, MAX_COLS),
            crop_origin(marker.map(|p| p.y), h, MAX_ROWS),
        );

        let mut window: Vec<Vec<char>> = grid.rows()[origin.y..(origin.y + MAX_ROWS).min(h)]
            .iter()
            .map(|row| row[origin.x..(origin.x + MAX_COLS).min(w)].to_vec())
            .collect();
        let dropped_top = strip_blank_edges(&mut window);

        if window.is_empty() {
            return fallback("Map data missing; generated fallback.");
        }

        offset = Coord::new(origin.x, origin.y + dropped_top);
        grid = Grid::from_rows(window);
        warnings.push(format!(
            "Map exceeded bounds ({w}x{h}); cropped to {MAX_COLS}x{MAX_ROWS}."
        ));
    }

    if repair_marker(&mut grid, &mut warnings) {
        // Blanked duplicates may leave empty rows below the kept marker.
        let mut rows = grid.rows().to_vec();
        strip_blank_edges(&mut rows);
        grid = Grid::from_rows(rows);
    }

    for w in &warnings {
        tracing::warn!(target: "normalize", "{w}");
    }
    NormalizedMap { grid, warnings, offset }
}

/// The 20×10 room used when the source sent no map at all.
pub fn fallback_room() -> Grid {
    let mut rows = vec![vec!['.'; FALLBACK_COLS]; FALLBACK_ROWS];
    for (y, row) in rows.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            if x == 0 || y == 0 || x == FALLBACK_COLS - 1 || y == FALLBACK_ROWS - 1 {
                *cell = '▓';
            }
        }
    }
    let mid_x = FALLBACK_COLS / 2;
    let mid_y = FALLBACK_ROWS / 2;
    rows[FALLBACK_ROWS - 1][mid_x] = '▲';
    rows[mid_y][0] = '►';
    rows[mid_y][FALLBACK_COLS - 1] = '◄';
    rows[mid_y][mid_x] = PLAYER;
    Grid::from_rows(rows)
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

fn fallback(warning: &str) -> NormalizedMap {
    tracing::warn!(target: "normalize", "{warning}");
    NormalizedMap {
        grid: fallback_room(),
        warnings: vec![warning.to_string()],
        offset: Coord::default(),
    }
}

fn is_blank(row: &[char]) -> bool {
    row.iter().all(|c| c.is_whitespace())
}

/// Drop blank rows at both ends. Returns how many were removed from the top.
fn strip_blank_edges(rows: &mut Vec<Vec<char>>) -> usize {
    let top = rows.iter().take_while(|r| is_blank(r)).count();
    rows.drain(..top);
    while rows.last().map_or(false, |r| is_blank(r)) {
        rows.pop();
    }
    top
}

/// One axis of the crop window: centered on the marker, clamped to the source.
fn crop_origin(marker: Option<usize>, size: usize, max: usize) -> usize {
    if size <= max {
        return 0;
    }
    match marker {
        Some(p) => p.saturating_sub(max / 2).min(size - max),
        None => 0,
    }
}

/// Returns `true` when duplicate markers were blanked.
fn repair_marker(grid: &mut Grid, warnings: &mut Vec<String>) -> bool {
    let markers: Vec<Coord> = grid
        .cells()
        .filter(|&(_, c)| c == PLAYER)
        .map(|(at, _)| at)
        .collect();

    match markers.len() {
        0 => {
            let center = Coord::new(grid.width() / 2, grid.height() / 2);
            let under = grid.get(center).unwrap_or(' ');
            grid.set(center, PLAYER);
            warnings.push("Map missing player marker; placed at center.".to_string());
            if GlyphClass::of(under).blocks_movement() {
                warnings.push(format!(
                    "Player marker placed over blocking glyph '{under}' at {center}."
                ));
            }
        }
        1 => {}
        n => {
            for &extra in &markers[1..] {
                grid.set(extra, ' ');
            }
            warnings.push(format!("Map contained {n} player markers; kept the first."));
            return true;
        }
    }
    false
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Completely random text, newlines included.
    fn arbitrary_text() -> impl Strategy<Value = String> {
        prop::collection::vec(any::<char>(), 0..800).prop_map(|chars| chars.into_iter().collect())
    }

    /// Map-like text: rows of legend glyphs, sometimes huge, mixed line endings.
    fn map_like_text() -> impl Strategy<Value = String> {
        let row = "[ .#@A-Z*$!?▪◎►◄▲+▓│~≈\\[\\]]{0,45}";
        let sep = prop_oneof![Just("\n"), Just("\r\n"), Just("\r")];
        prop::collection::vec((row, sep), 0..25).prop_map(|parts| {
            parts.into_iter().map(|(r, s)| format!("{r}{s}")).collect()
        })
    }

    fn check_invariants(m: &NormalizedMap) -> Result<(), TestCaseError> {
        let g = &m.grid;
        prop_assert!(g.width() >= 1 && g.width() <= MAX_COLS);
        prop_assert!(g.height() >= 1 && g.height() <= MAX_ROWS);
        prop_assert!(g.rows().iter().all(|r| r.len() == g.width()));
        prop_assert_eq!(g.count(PLAYER), 1);
        Ok(())
    }

    proptest! {
        #[test]
        fn arbitrary_text_normalizes_to_valid_grid(raw in arbitrary_text()) {
            check_invariants(&normalize(&raw))?;
        }

        #[test]
        fn map_like_text_normalizes_to_valid_grid(raw in map_like_text()) {
            check_invariants(&normalize(&raw))?;
        }

        #[test]
        fn normalize_is_idempotent(raw in map_like_text()) {
            let first = normalize(&raw);
            let again = normalize(&first.grid.to_string());
            prop_assert_eq!(&again.grid, &first.grid);
            prop_assert!(again.warnings.is_empty());
            prop_assert_eq!(again.offset, Coord::default());
        }
    }
}
