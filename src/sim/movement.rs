/// Movement resolver: classifies one attempted step of the player marker.
///
/// Pure apart from the local step mutation (grid cells + underfoot cache).
/// Indices are rebuilt from the current grid on every call.
///
/// ## Classification table (first match wins)
/// ┌──────────────────────────────┬──────────────────────────────────┐
/// │ Target                        │ Outcome                          │
/// ├──────────────────────────────┼──────────────────────────────────┤
/// │ No '@' and no name initial    │ Ignored                          │
/// │ Out of bounds                 │ Choice "Leave the area"          │
/// │ NPC anchor with an entity     │ Choice "Approach <name>"         │
/// │ Container glyph               │ OpenContainer(i) / Ignored       │
/// │ Interactable glyph            │ Choice "Inspect the <label>"     │
/// │ Structure / landmark          │ Blocked                          │
/// │ Exit glyph                    │ Choice "Go to <label>" / leave   │
/// │ Door                          │ Choice "Move through the doorway"│
/// │ Otherwise                     │ Stepped (grid mutated)           │
/// └──────────────────────────────┴──────────────────────────────────┘

use rand::Rng;

use crate::domain::entity::{Container, Entity};
use crate::domain::glyph::{self, GlyphClass, LABEL_OPEN, PLAYER};
use crate::domain::grid::{label_spans, Coord, Direction, Grid};
use crate::domain::index::{EntityIndex, ItemIndex, PLACEHOLDER_ITEM};
use crate::domain::narrative::{self, StepContext};
use super::event::{self, MoveOutcome};

/// Client-side movement memory. Lives across local steps, reset per turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovementState {
    /// Terrain hidden under the marker; restored when the marker leaves.
    pub underfoot: char,
    /// Location the viewport was last centered on.
    pub last_synced_location: Option<String>,
}

impl Default for MovementState {
    fn default() -> Self {
        MovementState { underfoot: ' ', last_synced_location: None }
    }
}

impl MovementState {
    /// A fresh grid arrived: whatever was underfoot is gone.
    pub fn reset_for_new_turn(&mut self) {
        self.underfoot = ' ';
    }

    /// Record the location and report whether it changed.
    pub fn sync_location(&mut self, location: &str) -> bool {
        if self.last_synced_location.as_deref() == Some(location) {
            return false;
        }
        self.last_synced_location = Some(location.to_string());
        true
    }
}

/// Read-only inputs the resolver needs besides the grid.
pub struct MoveContext<'a> {
    pub entities: &'a [Entity],
    pub interactables: &'a [String],
    pub containers: &'a [Container],
    pub player_name: &'a str,
    pub location: &'a str,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn resolve_move<R: Rng + ?Sized>(
    state: &mut MovementState,
    grid: &mut Grid,
    ctx: &MoveContext<'_>,
    dir: Direction,
    rng: &mut R,
) -> MoveOutcome {
    let Some(from) = locate_player(grid, ctx.player_name) else {
        tracing::debug!(target: "movement", "no player marker; move ignored");
        return MoveOutcome::Ignored;
    };

    let Some(to) = grid.step(from, dir) else {
        return MoveOutcome::choice(event::LEAVE_AREA);
    };
    let target = grid.get(to).unwrap_or(' ');
    let class = GlyphClass::of(target);
    tracing::debug!(target: "movement", "{} → {to} '{target}' ({class:?})", dir.name());

    if class == GlyphClass::Npc {
        if let Some(npc) = EntityIndex::build(grid, ctx.entities).get(to) {
            return MoveOutcome::choice(event::approach(&npc.name));
        }
    }

    match class {
        GlyphClass::Container => {
            return match ctx.containers.iter().position(|c| c.at == to) {
                Some(i) => MoveOutcome::OpenContainer(i),
                None => MoveOutcome::Ignored,
            };
        }
        GlyphClass::Interactable => {
            let items = ItemIndex::build(grid, ctx.interactables);
            let label = items.get(to).unwrap_or(PLACEHOLDER_ITEM);
            return MoveOutcome::choice(event::inspect(label));
        }
        c if c.blocks_movement() => return MoveOutcome::Blocked,
        GlyphClass::Exit => {
            return MoveOutcome::choice(event::go_to(exit_label(grid, to).as_deref()));
        }
        GlyphClass::Door => return MoveOutcome::choice(event::THROUGH_DOORWAY),
        _ => {}
    }

    apply_step(state, grid, from, to, target);
    let narrative = narrative::step_narrative(
        &StepContext {
            grid,
            position: to,
            direction: dir,
            location: ctx.location,
            entities: ctx.entities,
            stepped_on: target,
        },
        rng,
    );
    MoveOutcome::Stepped { from, to, narrative }
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

/// The '@' marker, or the first occurrence of the player's initial when
/// the source drew the player with a letter instead.
pub fn locate_player(grid: &Grid, player_name: &str) -> Option<Coord> {
    if let Some(at) = grid.find(PLAYER) {
        return Some(at);
    }
    let initial = player_name.trim().chars().next()?.to_ascii_uppercase();
    let at = grid.find(initial)?;
    tracing::warn!(
        target: "movement",
        "map used '{initial}' instead of '{PLAYER}' for the player at {at}; auto-correcting"
    );
    Some(at)
}

/// Label of the zone an exit leads to: the first `[...]` from the exit
/// rightwards, else the last one left of it with no `[` after it. The two
/// sides are paired separately, so an unclosed `[` on the left never
/// swallows a label on the right.
pub fn exit_label(grid: &Grid, at: Coord) -> Option<String> {
    let row = grid.rows().get(at.y)?;
    let (before, after) = row.split_at(at.x.min(row.len()));
    if let Some(span) = label_spans(after, at.y).into_iter().find(|s| !s.text.is_empty()) {
        return Some(span.text);
    }
    label_spans(before, at.y)
        .into_iter()
        .filter(|s| !s.text.is_empty())
        .last()
        .filter(|s| !before[s.end + 1..].contains(&LABEL_OPEN))
        .map(|s| s.text)
}

fn apply_step(state: &mut MovementState, grid: &mut Grid, from: Coord, to: Coord, target: char) {
    grid.set(from, state.underfoot);
    state.underfoot = if glyph::keeps_underfoot(target) { target } else { ' ' };
    grid.set(to, PLAYER);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ContainerKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Fixture {
        grid: Grid,
        state: MovementState,
        entities: Vec<Entity>,
        interactables: Vec<String>,
        containers: Vec<Container>,
        rng: ChaCha8Rng,
    }

    impl Fixture {
        fn new(map: &str) -> Self {
            Fixture {
                grid: Grid::parse(map),
                state: MovementState::default(),
                entities: vec![],
                interactables: vec![],
                containers: vec![],
                rng: ChaCha8Rng::seed_from_u64(9),
            }
        }

        fn go(&mut self, dir: Direction) -> MoveOutcome {
            let ctx = MoveContext {
                entities: &self.entities,
                interactables: &self.interactables,
                containers: &self.containers,
                player_name: "Yusuf",
                location: "Kitchen, House of Yusuf",
            };
            resolve_move(&mut self.state, &mut self.grid, &ctx, dir, &mut self.rng)
        }
    }

    #[test]
    fn wall_blocks_without_mutation() {
        let mut f = Fixture::new("###\n#@#\n###");
        let before = f.grid.clone();
        assert_eq!(f.go(Direction::North), MoveOutcome::Blocked);
        assert_eq!(f.grid, before);
    }

    #[test]
    fn landmarks_block() {
        let mut f = Fixture::new(".@○");
        assert_eq!(f.go(Direction::East), MoveOutcome::Blocked);
    }

    #[test]
    fn terrain_is_left_behind() {
        let mut f = Fixture::new(".@~.");
        f.state.underfoot = '.';
        match f.go(Direction::East) {
            MoveOutcome::Stepped { from, to, narrative } => {
                assert_eq!(from, Coord::new(1, 0));
                assert_eq!(to, Coord::new(2, 0));
                assert!(narrative.ends_with('.'));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(f.grid.to_string(), "..@.");
        assert_eq!(f.state.underfoot, '~');

        f.go(Direction::East);
        assert_eq!(f.grid.to_string(), "..~@");
        assert_eq!(f.state.underfoot, '.');
    }

    #[test]
    fn non_terrain_passables_are_not_remembered() {
        let mut f = Fixture::new("@†.");
        f.go(Direction::East);
        assert_eq!(f.state.underfoot, ' ');
        f.go(Direction::East);
        assert_eq!(f.grid.to_string(), "  @");
    }

    #[test]
    fn edge_and_unlabeled_exit_both_leave() {
        let mut f = Fixture::new("@..►");
        let edge = f.go(Direction::West);
        let mut f = Fixture::new("..@►");
        let exit = f.go(Direction::East);
        assert_eq!(edge, MoveOutcome::choice("Leave the area"));
        assert_eq!(edge, exit);
    }

    #[test]
    fn exit_prefers_label_to_the_right() {
        let mut f = Fixture::new("[YARD] .@► [SOUK]\n..........");
        assert_eq!(f.go(Direction::East), MoveOutcome::choice("Go to SOUK"));
    }

    #[test]
    fn exit_falls_back_to_label_on_the_left() {
        let mut f = Fixture::new("[YARD] .@►");
        assert_eq!(f.go(Direction::East), MoveOutcome::choice("Go to YARD"));
    }

    #[test]
    fn unclosed_bracket_left_of_exit_keeps_right_label() {
        let mut f = Fixture::new("[X @►[Y]");
        assert_eq!(f.go(Direction::East), MoveOutcome::choice("Go to Y"));
    }

    #[test]
    fn left_label_followed_by_open_bracket_is_ignored() {
        let mut f = Fixture::new("[YARD] [ .@►");
        assert_eq!(f.go(Direction::East), MoveOutcome::choice("Leave the area"));
    }

    #[test]
    fn npc_anchor_becomes_approach() {
        let mut f = Fixture::new("@B");
        f.entities.push(Entity::named("Bilal"));
        assert_eq!(f.go(Direction::East), MoveOutcome::choice("Approach Bilal"));
    }

    #[test]
    fn unknown_npc_letter_is_walkable() {
        let mut f = Fixture::new("@Q");
        assert!(matches!(f.go(Direction::East), MoveOutcome::Stepped { .. }));
        assert_eq!(f.grid.to_string(), " @");
    }

    #[test]
    fn interactable_uses_item_label_or_placeholder() {
        let mut f = Fixture::new("*@*");
        f.interactables.push("Lamp".into());
        assert_eq!(f.go(Direction::West), MoveOutcome::choice("Inspect the Lamp"));
        assert_eq!(f.go(Direction::East), MoveOutcome::choice("Inspect the object"));
    }

    #[test]
    fn door_is_a_choice() {
        let mut f = Fixture::new("@+");
        assert_eq!(f.go(Direction::East), MoveOutcome::choice("Move through the doorway"));
    }

    #[test]
    fn container_opens_only_when_one_is_there() {
        let mut f = Fixture::new("▪@◎");
        f.containers.push(Container {
            id: "c1".into(),
            name: "Old chest".into(),
            kind: ContainerKind::Chest,
            symbol: '▪',
            contents: vec![],
            at: Coord::new(0, 0),
            searched: false,
        });
        let before = f.grid.clone();
        assert_eq!(f.go(Direction::West), MoveOutcome::OpenContainer(0));
        assert_eq!(f.go(Direction::East), MoveOutcome::Ignored);
        assert_eq!(f.grid, before);
    }

    #[test]
    fn player_initial_stands_in_for_missing_marker() {
        let mut f = Fixture::new(".Y.");
        assert!(matches!(f.go(Direction::East), MoveOutcome::Stepped { .. }));
        assert_eq!(f.grid.to_string(), ". @");
    }

    #[test]
    fn no_player_means_ignored() {
        let mut f = Fixture::new("...");
        assert_eq!(f.go(Direction::East), MoveOutcome::Ignored);
    }

    #[test]
    fn location_sync_reports_changes_once() {
        let mut s = MovementState::default();
        assert!(s.sync_location("Souk"));
        assert!(!s.sync_location("Souk"));
        assert!(s.sync_location("Kitchen"));
    }
}
