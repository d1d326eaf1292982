/// Position index: which entity or interactable sits at which cell.
///
/// Two independent builders over one grid. Both are pure functions of
/// (grid, list) and are rebuilt on every render and every resolver call;
/// nothing here is persisted between turns.
///
/// ## Entity matching policy
///   An anchor is an 'A'-'Z' cell outside any `[...]` label span.
///   Each anchor takes the first entity whose name starts with that
///   letter (case-insensitive) and which no earlier anchor has taken.
///   When every same-initial entity is taken, the first match is reused,
///   so duplicate glyphs collapse onto one description.
///   Anchors with no matching entity stay unindexed ("unknown figure").

use std::collections::HashMap;

use super::entity::Entity;
use super::glyph::{GlyphClass, INTERACTABLE_GLYPHS};
use super::grid::{Coord, Grid};

/// Label used for interactable glyphs beyond the end of the label list.
pub const PLACEHOLDER_ITEM: &str = "object";

pub struct EntityIndex<'a> {
    entities: &'a [Entity],
    at: HashMap<Coord, usize>,
}

impl<'a> EntityIndex<'a> {
    pub fn build(grid: &Grid, entities: &'a [Entity]) -> Self {
        let mask = grid.label_mask();
        let mut at = HashMap::new();
        let mut used = vec![false; entities.len()];

        for (pos, ch) in grid.cells() {
            if GlyphClass::of(ch) != GlyphClass::Npc || mask[pos.y][pos.x] {
                continue;
            }
            let matches = |e: &Entity| e.initial() == Some(ch);
            let pick = entities
                .iter()
                .enumerate()
                .position(|(i, e)| !used[i] && matches(e))
                .or_else(|| entities.iter().position(matches));
            if let Some(i) = pick {
                used[i] = true;
                at.insert(pos, i);
            }
        }

        EntityIndex { entities, at }
    }

    pub fn get(&self, pos: Coord) -> Option<&'a Entity> {
        self.at.get(&pos).map(|&i| &self.entities[i])
    }

    pub fn len(&self) -> usize {
        self.at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.at.is_empty()
    }

    /// Indexed anchors in row-major order.
    pub fn anchors(&self) -> Vec<(Coord, &'a Entity)> {
        let mut out: Vec<_> = self.at.iter().map(|(&p, &i)| (p, &self.entities[i])).collect();
        out.sort_by_key(|&(p, _)| (p.y, p.x));
        out
    }
}

pub struct ItemIndex {
    at: HashMap<Coord, String>,
}

impl ItemIndex {
    pub fn build(grid: &Grid, labels: &[String]) -> Self {
        let at = grid
            .cells()
            .filter(|&(_, ch)| INTERACTABLE_GLYPHS.contains(&ch))
            .enumerate()
            .map(|(i, (pos, _))| {
                let label = labels.get(i).map(String::as_str).unwrap_or(PLACEHOLDER_ITEM);
                (pos, label.to_string())
            })
            .collect();
        ItemIndex { at }
    }

    pub fn get(&self, pos: Coord) -> Option<&str> {
        self.at.get(&pos).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.at.is_empty()
    }
}
