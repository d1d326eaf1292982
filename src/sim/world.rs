/// WorldState: the complete snapshot of a running session.
///
/// ## Authority
///
/// The turn collaborator owns the truth. Each payload replaces the grid,
/// entity/interactable lists and (when sent) the containers wholesale;
/// local steps only move the `@` marker between full turns.
///
/// ## Turn guard
///
///   Ready ──begin_turn──▶ AwaitingTurn ──finish_turn──▶ Ready | GameOver
///
/// At most one turn is in flight. Choice outcomes raised while a turn is
/// pending are dropped; passable steps never consult the guard.
///
/// ## Camera / Viewport
///
/// World coordinates and screen coordinates are separate:
///   - `camera`: viewport into the grid (top-left corner + size)
///   - Renderer maps: `screen(sx, sy) = world(camera.x + sx, camera.y + sy)`
///   - Location change → snap to center; same location → dead-zone follow
///   - Grids smaller than the viewport are centered

use rand_chacha::ChaCha8Rng;

use crate::domain::entity::{Activity, Condition, Container, ContainerKind, Entity, Role, Status};
use crate::domain::glyph::CONTAINER_GLYPHS;
use crate::domain::grid::{Coord, Direction, Grid};
use crate::domain::location::{self, WealthTier};
use crate::error::TurnError;
use super::event::{self, MoveOutcome};
use super::movement::{self, MoveContext, MovementState};
use super::normalize::{self, NormalizedMap};
use super::scene::{Interaction, SceneInput, SceneProjector};
use super::turn::{GameOption, RawContainer, RawEntity, TurnPayload, TurnRequest, TurnSource};

pub const BLOCKED: &str = "Blocked.";
const MAX_HEALTH: u8 = 100;
const FALLBACK_NARRATIVE: &str = "The moment passes without event. The world around you seems unchanged.";
const DEFAULT_OPTIONS: [&str; 3] = ["Look around", "Wait", "Pray"];
const FILLER_OPTION: &str = "Continue";

// ══════════════════════════════════════════════════════════════
// Camera
// ══════════════════════════════════════════════════════════════

/// Viewport into the grid.
///
/// `(x, y)` is the grid coordinate of the top-left visible cell (negative
/// when a small grid is centered). `(view_w, view_h)` is set by the
/// renderer from the terminal size.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub view_w: usize,
    pub view_h: usize,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dead-zone follow: scroll only when the target nears the viewport edge.
    pub fn follow(&mut self, target: Coord, world_w: usize, world_h: usize) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        self.x = follow_axis(self.x, target.x, self.view_w, world_w);
        self.y = follow_axis(self.y, target.y, self.view_h, world_h);
    }

    /// Snap to center on the target (no dead zone).
    pub fn center_on(&mut self, target: Coord, world_w: usize, world_h: usize) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        self.x = center_axis(target.x, self.view_w, world_w);
        self.y = center_axis(target.y, self.view_h, world_h);
    }

    /// Grid coordinate → viewport coordinate, if visible.
    pub fn world_to_view(&self, at: Coord) -> Option<(usize, usize)> {
        let vx = at.x as i32 - self.x;
        let vy = at.y as i32 - self.y;
        if vx >= 0 && vx < self.view_w as i32 && vy >= 0 && vy < self.view_h as i32 {
            Some((vx as usize, vy as usize))
        } else {
            None
        }
    }
}

fn centered_origin(view: usize, world: usize) -> i32 {
    -((view as i32 - world as i32) / 2)
}

fn clamp_origin(origin: i32, view: usize, world: usize) -> i32 {
    origin.max(0).min((world as i32 - view as i32).max(0))
}

fn center_axis(target: usize, view: usize, world: usize) -> i32 {
    if world <= view {
        return centered_origin(view, world);
    }
    clamp_origin(target as i32 - view as i32 / 2, view, world)
}

fn follow_axis(origin: i32, target: usize, view: usize, world: usize) -> i32 {
    if world <= view {
        return centered_origin(view, world);
    }
    // 20% margin on each side; the target moves freely inside.
    let margin = view as i32 / 5;
    let low = origin + margin;
    let high = origin + view as i32 - margin - 1;
    let t = target as i32;
    let next = if t < low {
        t - margin
    } else if t > high {
        t - view as i32 + margin + 1
    } else {
        origin
    };
    clamp_origin(next, view, world)
}

// ══════════════════════════════════════════════════════════════
// Session types
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Ready,
    AwaitingTurn,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameStatus {
    Alive,
    Dead,
    Survived,
}

impl GameStatus {
    pub fn parse(raw: Option<&str>) -> GameStatus {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("dead") => GameStatus::Dead,
            Some("survived") => GameStatus::Survived,
            _ => GameStatus::Alive,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LogRole {
    System,
    Player,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub role: LogRole,
    pub text: String,
    pub turn: Option<u32>,
    pub location: Option<String>,
}

impl LogEntry {
    pub fn system(text: &str) -> Self {
        LogEntry { role: LogRole::System, text: text.to_string(), turn: None, location: None }
    }

    pub fn player(text: &str) -> Self {
        LogEntry { role: LogRole::Player, text: text.to_string(), turn: None, location: None }
    }
}

/// Token for the single in-flight turn. Only `begin_turn` creates one.
#[derive(Debug)]
pub struct PendingTurn {
    pub request: TurnRequest,
    placeholder: usize,
}

// ══════════════════════════════════════════════════════════════
// WorldState
// ══════════════════════════════════════════════════════════════

pub struct WorldState {
    // ── Spatial model (replaced every full turn) ──
    pub grid: Grid,
    pub offset: Coord,
    pub entities: Vec<Entity>,
    pub interactables: Vec<String>,
    pub containers: Vec<Container>,
    pub location: String,
    pub tier: WealthTier,

    // ── Player ──
    pub player_name: String,
    pub health: u8,
    pub inventory: Vec<String>,
    pub status: GameStatus,

    // ── Turn tracking ──
    pub phase: Phase,
    pub turn: u32,
    pub options: Vec<GameOption>,
    pub history: Vec<LogEntry>,
    /// Repairs made to the latest payload.
    pub warnings: Vec<String>,

    // ── Client-side state ──
    pub movement: MovementState,
    pub camera: Camera,
    pub scene: SceneProjector,
    pub active_container: Option<usize>,
    rng: ChaCha8Rng,
}

impl WorldState {
    pub fn new(player_name: &str, rng: ChaCha8Rng) -> Self {
        WorldState {
            grid: normalize::fallback_room(),
            offset: Coord::default(),
            entities: vec![],
            interactables: vec![],
            containers: vec![],
            location: String::new(),
            tier: WealthTier::Modest,
            player_name: player_name.to_string(),
            health: MAX_HEALTH,
            inventory: vec![],
            status: GameStatus::Alive,
            phase: Phase::Ready,
            turn: 0,
            options: vec![],
            history: vec![],
            warnings: vec![],
            movement: MovementState::default(),
            camera: Camera::new(),
            scene: SceneProjector::new(),
            active_container: None,
            rng,
        }
    }

    /// Apply the opening payload and log its narrative.
    pub fn start(&mut self, payload: TurnPayload) {
        let narrative = payload.narrative.clone();
        self.apply_turn(payload);
        let mut entry = LogEntry::system(&narrative);
        entry.turn = Some(self.turn);
        entry.location = Some(self.location.clone());
        self.history.push(entry);
    }

    /// Replace the spatial model with a validated payload.
    pub fn apply_turn(&mut self, payload: TurnPayload) {
        self.movement.reset_for_new_turn();
        self.active_container = None;

        let NormalizedMap { grid, mut warnings, offset } = normalize::normalize(&payload.local_map_ascii);
        // The normalizer logs its own repairs.
        let map_repairs = warnings.len();
        self.grid = grid;
        self.offset = offset;

        self.entities = sanitize_entities(&payload.present_entities);
        self.interactables = payload.present_interactables;

        if let Some(raw) = &payload.present_containers {
            let placed = place_containers(raw, offset, &self.grid);
            if placed.len() != raw.len() {
                warnings.push("Removed containers with invalid coordinates.".to_string());
            }
            self.containers = placed;
        }

        let (options, padded) = complete_options(payload.options);
        if padded {
            warnings.push("Options list was incomplete; added defaults.".to_string());
        }
        self.options = options;

        if let Some(loc) = payload.new_location {
            self.location = loc;
        }
        self.tier = location::resolve_wealth_tier(payload.location_wealth.as_deref(), &self.location);

        if let Some(h) = payload.updated_health {
            self.health = h.clamp(0, i64::from(MAX_HEALTH)) as u8;
        }
        if let Some(inv) = payload.updated_inventory {
            self.inventory = inv;
        }

        self.status = GameStatus::parse(payload.game_status.as_deref());
        if self.health == 0 {
            self.status = GameStatus::Dead;
        }
        if self.status == GameStatus::Dead {
            self.health = 0;
        }
        self.phase = if payload.is_game_over || self.status != GameStatus::Alive {
            Phase::GameOver
        } else {
            Phase::Ready
        };

        for w in &warnings[map_repairs..] {
            tracing::warn!(target: "world", "{w}");
        }
        self.warnings = warnings;

        self.sync_viewport();
        self.sync_scene();
    }

    // ── Local movement ──

    pub fn attempt_move(&mut self, dir: Direction) -> MoveOutcome {
        if self.phase == Phase::GameOver {
            return MoveOutcome::Ignored;
        }
        let ctx = MoveContext {
            entities: &self.entities,
            interactables: &self.interactables,
            containers: &self.containers,
            player_name: &self.player_name,
            location: &self.location,
        };
        let outcome = movement::resolve_move(&mut self.movement, &mut self.grid, &ctx, dir, &mut self.rng);

        match &outcome {
            MoveOutcome::Blocked => self.history.push(LogEntry::system(BLOCKED)),
            MoveOutcome::Stepped { narrative, .. } => {
                let mut entry = LogEntry::system(narrative);
                entry.location = Some(self.location.clone());
                self.history.push(entry);
                self.sync_viewport();
                self.sync_scene();
            }
            MoveOutcome::OpenContainer(i) => self.active_container = Some(*i),
            MoveOutcome::Choice(_) if self.phase == Phase::AwaitingTurn => {
                tracing::debug!(target: "world", "choice dropped; turn in flight");
                return MoveOutcome::Ignored;
            }
            _ => {}
        }
        outcome
    }

    /// Same outcome a grid step into `at` would give, reached by clicking
    /// the scene instead.
    pub fn interact_at(&mut self, at: Coord) -> MoveOutcome {
        if self.phase == Phase::GameOver {
            return MoveOutcome::Ignored;
        }
        let picked = self.scene.scene().and_then(|s| s.pick(at)).cloned();
        let outcome = match picked {
            Some(Interaction::Exit { label }) => MoveOutcome::choice(event::go_to(label.as_deref())),
            Some(Interaction::Npc { name }) => MoveOutcome::choice(event::approach(&name)),
            Some(Interaction::Item { label }) => MoveOutcome::choice(event::inspect(&label)),
            Some(Interaction::Container { at }) => match self.containers.iter().position(|c| c.at == at) {
                Some(i) => {
                    self.active_container = Some(i);
                    MoveOutcome::OpenContainer(i)
                }
                None => MoveOutcome::Ignored,
            },
            Some(Interaction::Player { .. }) | None => MoveOutcome::Ignored,
        };
        if outcome.is_choice() && self.phase == Phase::AwaitingTurn {
            return MoveOutcome::Ignored;
        }
        outcome
    }

    // ── Containers ──

    pub fn active_container(&self) -> Option<&Container> {
        self.active_container.and_then(|i| self.containers.get(i))
    }

    /// Move one item from the open container into the inventory.
    pub fn take_item(&mut self, item: &str) -> bool {
        let Some(c) = self.active_container.and_then(|i| self.containers.get_mut(i)) else {
            return false;
        };
        match c.take(item) {
            Some(taken) => {
                self.inventory.push(taken);
                true
            }
            None => false,
        }
    }

    /// Empty the open container into the inventory and close it.
    pub fn take_all(&mut self) -> usize {
        let Some(c) = self.active_container.and_then(|i| self.containers.get_mut(i)) else {
            return 0;
        };
        let items = c.take_all();
        let n = items.len();
        self.inventory.extend(items);
        self.active_container = None;
        n
    }

    pub fn close_container(&mut self) {
        self.active_container = None;
    }

    // ── Full turns ──

    /// Raise the guard and open a placeholder entry. `None` while a turn is
    /// in flight, after game over, or for an empty choice.
    pub fn begin_turn(&mut self, choice: &str) -> Option<PendingTurn> {
        let choice = choice.trim();
        if self.phase != Phase::Ready || choice.is_empty() {
            tracing::debug!(target: "world", "turn refused in {:?}: {choice:?}", self.phase);
            return None;
        }
        self.phase = Phase::AwaitingTurn;
        self.history.push(LogEntry::player(&format!("> {choice}")));
        self.history.push(LogEntry::system(""));

        Some(PendingTurn {
            request: TurnRequest {
                choice: choice.to_string(),
                turn: self.turn + 1,
                location: self.location.clone(),
                health: self.health,
                inventory: self.inventory.clone(),
            },
            placeholder: self.history.len() - 1,
        })
    }

    /// Show partial narrative in the placeholder entry.
    pub fn stream_partial(&mut self, pending: &PendingTurn, text: &str) {
        set_entry_text(&mut self.history, pending.placeholder, text);
    }

    /// Replace the placeholder with the final result and lower the guard.
    pub fn finish_turn(&mut self, pending: PendingTurn, result: Result<TurnPayload, TurnError>) {
        let idx = pending.placeholder;
        match result {
            Ok(payload) => {
                let narrative = payload.narrative.clone();
                self.turn += 1;
                self.apply_turn(payload);
                if let Some(entry) = self.history.get_mut(idx) {
                    entry.text = narrative;
                    entry.turn = Some(self.turn);
                    entry.location = Some(self.location.clone());
                }
            }
            Err(e) => {
                tracing::warn!(target: "world", "turn for {:?} failed: {e}", pending.request.choice);
                set_entry_text(&mut self.history, idx, FALLBACK_NARRATIVE);
                self.history.push(LogEntry::system(&format!("Turn data invalid: {e}. Using fallback.")));
                self.phase = Phase::Ready;
            }
        }
    }

    /// Full turn round trip over a turn source. Returns `false` when the
    /// guard refused the choice.
    pub fn dispatch_choice(&mut self, source: &mut dyn TurnSource, choice: &str) -> bool {
        let Some(pending) = self.begin_turn(choice) else { return false };
        let idx = pending.placeholder;
        let history = &mut self.history;
        let result = source.request_turn(&pending.request, &mut |partial| {
            set_entry_text(history, idx, partial);
        });
        self.finish_turn(pending, result);
        true
    }

    // ── Derived views ──

    pub fn player_pos(&self) -> Option<Coord> {
        movement::locate_player(&self.grid, &self.player_name)
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Renderer calls this when the terminal size changes.
    pub fn set_viewport(&mut self, view_w: usize, view_h: usize) {
        self.camera.view_w = view_w;
        self.camera.view_h = view_h;
        if let Some(p) = self.player_pos() {
            self.camera.center_on(p, self.grid.width(), self.grid.height());
        }
    }

    fn sync_viewport(&mut self) {
        let Some(p) = self.player_pos() else { return };
        let (w, h) = (self.grid.width(), self.grid.height());
        if self.movement.sync_location(&self.location) {
            self.camera.center_on(p, w, h);
        } else {
            self.camera.follow(p, w, h);
        }
    }

    fn sync_scene(&mut self) {
        self.scene.sync(&SceneInput {
            grid: &self.grid,
            entities: &self.entities,
            interactables: &self.interactables,
            location: &self.location,
            tier: self.tier,
            player_name: &self.player_name,
        });
    }
}

// ══════════════════════════════════════════════════════════════
// Payload validation helpers
// ══════════════════════════════════════════════════════════════

fn set_entry_text(history: &mut [LogEntry], idx: usize, text: &str) {
    if let Some(entry) = history.get_mut(idx) {
        entry.text = text.to_string();
    }
}

/// Clean enum fields; drop entities without a name.
pub fn sanitize_entities(raw: &[RawEntity]) -> Vec<Entity> {
    raw.iter()
        .filter_map(|e| {
            let name = e.name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Entity {
                name: name.to_string(),
                status: Status::from_raw(e.status.as_deref()),
                role: Role::from_raw(e.role.as_deref()),
                condition: Condition::from_raw(e.condition.as_deref()),
                activity: Activity::from_raw(e.activity.as_deref()),
            })
        })
        .collect()
}

/// Translate absolute container coordinates into the cropped grid and drop
/// those that fall outside it.
pub fn place_containers(raw: &[RawContainer], offset: Coord, grid: &Grid) -> Vec<Container> {
    raw.iter()
        .filter_map(|c| {
            let x = c.x.checked_sub(offset.x as i64)?;
            let y = c.y.checked_sub(offset.y as i64)?;
            if !grid.in_bounds(x, y) {
                return None;
            }
            let kind = ContainerKind::from_raw(c.kind.as_deref());
            let symbol = c
                .symbol
                .as_deref()
                .and_then(|s| s.chars().next())
                .filter(|ch| CONTAINER_GLYPHS.contains(ch))
                .unwrap_or(if kind == ContainerKind::Jar { '◎' } else { '▪' });
            Some(Container {
                id: c.id.clone(),
                name: c.name.clone(),
                kind,
                symbol,
                contents: c.contents.clone(),
                at: Coord::new(x as usize, y as usize),
                searched: c.searched,
            })
        })
        .collect()
}

/// Defaults for an empty list; pad short lists with "Continue" to three.
/// Returns the list and whether padding happened.
pub fn complete_options(options: Vec<GameOption>) -> (Vec<GameOption>, bool) {
    if options.is_empty() {
        let defaults = DEFAULT_OPTIONS
            .iter()
            .enumerate()
            .map(|(i, t)| GameOption::new(i as u32 + 1, t))
            .collect();
        return (defaults, false);
    }
    let mut options = options;
    let padded = options.len() < DEFAULT_OPTIONS.len();
    while options.len() < DEFAULT_OPTIONS.len() {
        let id = options.len() as u32 + 1;
        options.push(GameOption::new(id, FILLER_OPTION));
    }
    (options, padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};

    fn world() -> WorldState {
        WorldState::new("Yusuf", ChaCha8Rng::seed_from_u64(3))
    }

    fn payload(map: &str) -> TurnPayload {
        TurnPayload {
            narrative: "Dawn.".into(),
            local_map_ascii: map.into(),
            new_location: Some("Kitchen, House of Yusuf".into()),
            options: vec![GameOption::new(1, "Look around"), GameOption::new(2, "Wait"), GameOption::new(3, "Pray")],
            ..TurnPayload::default()
        }
    }

    fn raw_container(x: i64, y: i64) -> RawContainer {
        RawContainer {
            id: format!("c{x}-{y}"),
            name: "Chest".into(),
            kind: Some("chest".into()),
            symbol: Some("▪".into()),
            contents: vec!["Bread".into(), "Knife".into()],
            x,
            y,
            searched: false,
        }
    }

    struct Canned(Result<TurnPayload, ()>);

    impl TurnSource for Canned {
        fn opening(&mut self) -> Result<TurnPayload, TurnError> {
            Err(TurnError::NoResponse { choice: String::new() })
        }

        fn request_turn(
            &mut self,
            request: &TurnRequest,
            on_partial: &mut dyn FnMut(&str),
        ) -> Result<TurnPayload, TurnError> {
            on_partial("half");
            self.0.clone().map_err(|_| TurnError::NoResponse { choice: request.choice.clone() })
        }
    }

    #[test]
    fn wall_move_keeps_position_and_logs_once() {
        let mut w = world();
        w.start(payload("###\n#@#\n###"));
        let before = w.history.len();
        assert_eq!(w.attempt_move(Direction::North), MoveOutcome::Blocked);
        assert_eq!(w.player_pos(), Some(Coord::new(1, 1)));
        assert_eq!(w.history.len(), before + 1);
        assert_eq!(w.history.last().unwrap().text, BLOCKED);
    }

    #[test]
    fn step_logs_narrative_and_moves_marker() {
        let mut w = world();
        w.start(payload("#....#\n#.@..#\n######"));
        let outcome = w.attempt_move(Direction::East);
        assert!(matches!(outcome, MoveOutcome::Stepped { .. }));
        assert_eq!(w.player_pos(), Some(Coord::new(3, 1)));
        assert!(w.history.last().unwrap().text.to_lowercase().contains("you"));
        assert_eq!(w.scene.stats().rebuilds, 2);
    }

    #[test]
    fn containers_are_offset_corrected_and_filtered() {
        let mut rows = vec![".".repeat(40); 20];
        rows[10].replace_range(20..21, "@");
        let mut p = payload(&rows.join("\n"));
        // Offset is (5,3); (6,4) lands at (1,1), (2,2) would be negative.
        p.present_containers = Some(vec![raw_container(6, 4), raw_container(2, 2)]);
        let mut w = world();
        w.start(p);
        assert_eq!(w.offset, Coord::new(5, 3));
        assert_eq!(w.containers.len(), 1);
        assert_eq!(w.containers[0].at, Coord::new(1, 1));
        assert!(w.warnings.contains(&"Removed containers with invalid coordinates.".to_string()));
    }

    #[test]
    fn extreme_container_coordinates_are_dropped() {
        let mut rows = vec![".".repeat(40); 20];
        rows[10].replace_range(20..21, "@");
        let mut p = payload(&rows.join("\n"));
        p.present_containers = Some(vec![
            raw_container(i64::MIN, 4),
            raw_container(6, i64::MIN),
            raw_container(i64::MAX, i64::MAX),
            raw_container(6, 4),
        ]);
        let mut w = world();
        w.start(p);
        assert_eq!(w.containers.len(), 1);
        assert_eq!(w.containers[0].at, Coord::new(1, 1));
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn each_repair_is_logged_once() {
        let log = CapturedLog::default();
        let sink = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();

        let mut w = world();
        let mut p = payload("...\n...");
        p.options = vec![GameOption::new(1, "Flee")];
        tracing::subscriber::with_default(subscriber, || w.start(p));

        let text = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text.matches("Map missing player marker").count(), 1);
        assert_eq!(text.matches("Options list was incomplete").count(), 1);
        assert_eq!(w.warnings.len(), 2);
    }

    #[test]
    fn absent_container_list_keeps_previous() {
        let mut w = world();
        let mut p = payload("▪@.");
        p.present_containers = Some(vec![raw_container(0, 0)]);
        w.start(p);
        w.apply_turn(payload(".@▪"));
        assert_eq!(w.containers.len(), 1);
        let mut p = payload(".@.");
        p.present_containers = Some(vec![]);
        w.apply_turn(p);
        assert!(w.containers.is_empty());
    }

    #[test]
    fn options_default_and_pad() {
        let (opts, padded) = complete_options(vec![]);
        assert!(!padded);
        assert_eq!(opts.iter().map(|o| o.text.as_str()).collect::<Vec<_>>(), DEFAULT_OPTIONS);

        let (opts, padded) = complete_options(vec![GameOption::new(1, "Flee")]);
        assert!(padded);
        assert_eq!(opts[1], GameOption::new(2, "Continue"));
        assert_eq!(opts[2], GameOption::new(3, "Continue"));
    }

    #[test]
    fn entities_are_sanitized() {
        let raw = vec![
            RawEntity { name: "  Bilal ".into(), role: Some("Neighbor (old friend)".into()), ..RawEntity::default() },
            RawEntity { name: "   ".into(), ..RawEntity::default() },
        ];
        let list = sanitize_entities(&raw);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Bilal");
        assert_eq!(list[0].role, Role::Neighbor);
        assert_eq!(list[0].status, Status::Active);
    }

    #[test]
    fn health_is_clamped_and_zero_means_dead() {
        let mut w = world();
        let mut p = payload(".@.");
        p.updated_health = Some(250);
        w.start(p);
        assert_eq!(w.health, 100);
        let mut p = payload(".@.");
        p.updated_health = Some(-5);
        w.apply_turn(p);
        assert_eq!(w.health, 0);
        assert_eq!(w.status, GameStatus::Dead);
        assert!(w.is_over());
        assert_eq!(w.attempt_move(Direction::East), MoveOutcome::Ignored);
    }

    #[test]
    fn wealth_tier_follows_location() {
        let mut w = world();
        let mut p = payload(".@.");
        p.new_location = Some("Khan As'ad Pasha".into());
        w.start(p);
        assert_eq!(w.tier, WealthTier::Merchant);
    }

    #[test]
    fn guard_admits_one_turn_at_a_time() {
        let mut w = world();
        w.start(payload(".@►"));
        let pending = w.begin_turn("Wait").unwrap();
        assert!(w.begin_turn("Pray").is_none());
        assert_eq!(w.attempt_move(Direction::East), MoveOutcome::Ignored);
        // Passable steps still work while the turn is pending.
        assert!(matches!(w.attempt_move(Direction::West), MoveOutcome::Stepped { .. }));

        w.stream_partial(&pending, "The bells");
        let placeholder = w.history.len() - 2;
        assert_eq!(w.history[placeholder].text, "The bells");

        let mut next = payload("@..");
        next.narrative = "The bells toll.".into();
        w.finish_turn(pending, Ok(next));
        assert_eq!(w.phase, Phase::Ready);
        assert_eq!(w.turn, 1);
        assert!(w.history.iter().any(|e| e.text == "> Wait" && e.role == LogRole::Player));
        assert!(w.history.iter().any(|e| e.text == "The bells toll." && e.turn == Some(1)));
        assert!(w.begin_turn("Pray").is_some());
    }

    #[test]
    fn failed_turn_uses_fallback_and_reopens() {
        let mut w = world();
        w.start(payload(".@."));
        assert!(w.dispatch_choice(&mut Canned(Err(())), "Dance"));
        assert_eq!(w.phase, Phase::Ready);
        assert_eq!(w.turn, 0);
        assert!(w.history.iter().any(|e| e.text == FALLBACK_NARRATIVE));
        assert!(w.history.last().unwrap().text.starts_with("Turn data invalid"));
    }

    #[test]
    fn dispatch_streams_then_replaces_placeholder() {
        let mut w = world();
        w.start(payload(".@."));
        let mut next = payload("..@");
        next.narrative = "Done.".into();
        assert!(w.dispatch_choice(&mut Canned(Ok(next)), "Wait"));
        assert_eq!(w.history.last().unwrap().text, "Done.");
        assert!(!w.history.iter().any(|e| e.text == "half"));
        assert_eq!(w.player_pos(), Some(Coord::new(2, 0)));
    }

    #[test]
    fn game_over_refuses_turns() {
        let mut w = world();
        let mut p = payload(".@.");
        p.is_game_over = true;
        p.game_status = Some("survived".into());
        w.start(p);
        assert_eq!(w.status, GameStatus::Survived);
        assert!(w.begin_turn("Wait").is_none());
    }

    #[test]
    fn take_item_and_take_all() {
        let mut w = world();
        let mut p = payload("▪@.");
        p.present_containers = Some(vec![raw_container(0, 0)]);
        w.start(p);
        assert_eq!(w.attempt_move(Direction::West), MoveOutcome::OpenContainer(0));
        assert!(w.take_item("Knife"));
        assert!(!w.take_item("Knife"));
        assert_eq!(w.inventory, vec!["Knife".to_string()]);
        assert!(w.active_container().unwrap().searched);
        assert_eq!(w.take_all(), 1);
        assert_eq!(w.inventory.len(), 2);
        assert!(w.active_container().is_none());
    }

    #[test]
    fn scene_click_matches_grid_step() {
        let mut w = world();
        let mut p = payload("[SOUK] .@►\n.......B.");
        p.present_entities = vec![RawEntity { name: "Bilal".into(), ..RawEntity::default() }];
        w.start(p);
        let clicked = w.interact_at(Coord::new(9, 0));
        assert_eq!(clicked, MoveOutcome::choice("Go to SOUK"));
        assert_eq!(w.attempt_move(Direction::East), clicked);
        assert_eq!(w.interact_at(Coord::new(7, 1)), MoveOutcome::choice("Approach Bilal"));
        assert_eq!(w.interact_at(Coord::new(0, 1)), MoveOutcome::Ignored);
    }

    #[test]
    fn new_location_recenters_camera() {
        let mut w = world();
        w.set_viewport(10, 5);
        let mut rows = vec![".".repeat(30); 14];
        rows[7].replace_range(25..26, "@");
        w.start(payload(&rows.join("\n")));
        assert_eq!(w.camera.x, 20);
        assert_eq!(w.camera.y, 5);
        assert_eq!(w.camera.world_to_view(Coord::new(25, 7)), Some((5, 2)));
    }

    #[test]
    fn small_grid_is_centered_in_viewport() {
        let mut cam = Camera { view_w: 10, view_h: 10, ..Camera::default() };
        cam.center_on(Coord::new(1, 1), 4, 2);
        assert_eq!((cam.x, cam.y), (-3, -4));
    }

    #[test]
    fn follow_scrolls_only_past_dead_zone() {
        let mut cam = Camera { x: 0, y: 0, view_w: 10, view_h: 10 };
        cam.follow(Coord::new(5, 5), 30, 14);
        assert_eq!((cam.x, cam.y), (0, 0));
        cam.follow(Coord::new(8, 5), 30, 14);
        assert_eq!(cam.x, 1);
    }
}
