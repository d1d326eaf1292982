/// Entry point and input loop.

mod ui;

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Duration;

use crossterm::event::KeyCode;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use glyphmap::config::{AppConfig, LogConfig};
use glyphmap::domain::grid::Direction;
use glyphmap::sim::event::MoveOutcome;
use glyphmap::sim::turn::{ScriptedTurns, TurnSource};
use glyphmap::sim::world::WorldState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::UiState;

const FRAME_SLEEP: Duration = Duration::from_millis(16);
/// Pause between streamed narrative updates.
const STREAM_DELAY: Duration = Duration::from_millis(35);

fn main() {
    let config = AppConfig::load();
    init_logging(&config.log);

    let seed = config.narrative_seed.unwrap_or_else(rand::random);
    tracing::info!(target: "main", "narrative seed {seed}");
    let mut world = WorldState::new(&config.player_name, ChaCha8Rng::seed_from_u64(seed));

    let mut source = match ScriptedTurns::load_or_embedded(&config.turns_dir) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Cannot load turn script: {e}");
            return;
        }
    };
    match source.opening() {
        Ok(opening) => world.start(opening),
        Err(e) => {
            eprintln!("Cannot start: {e}");
            return;
        }
    }

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &mut source);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("{}: {} turns, last seen in {}.", source.name(), world.turn, world.location);
}

/// File logging; the terminal itself is in raw mode. `RUST_LOG` wins over
/// the configured level.
fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let writer = match OpenOptions::new().create(true).append(true).open(&log.file) {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {e}", log.file.display());
            BoxMakeWriter::new(std::io::sink)
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    source: &mut dyn TurnSource,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut ui = UiState::default();

    loop {
        kb.drain_events();
        if kb.ctrl_c_pressed() {
            break;
        }

        if let Some((col, row)) = kb.mouse_moved {
            ui.hover = renderer.grid_at(world, col, row);
        }

        match handle_input(world, &mut ui, &kb, renderer) {
            Action::Idle => {}
            Action::Turn(choice) => play_turn(world, renderer, &ui, source, &choice)?,
            Action::Quit => break,
        }

        renderer.render(world, &ui)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s')];
const KEYS_CUSTOM: &[KeyCode] = &[KeyCode::Char('c'), KeyCode::Char('/')];
const KEYS_TAKE: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char('t')];
const KEYS_TAKE_ALL: &[KeyCode] = &[KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

fn detect_direction(kb: &InputState) -> Option<Direction> {
    if kb.any_pressed(KEYS_UP) {
        Some(Direction::North)
    } else if kb.any_pressed(KEYS_DOWN) {
        Some(Direction::South)
    } else if kb.any_pressed(KEYS_LEFT) {
        Some(Direction::West)
    } else if kb.any_pressed(KEYS_RIGHT) {
        Some(Direction::East)
    } else {
        None
    }
}

enum Action {
    Idle,
    Turn(String),
    Quit,
}

/// Apply this frame's input.
fn handle_input(world: &mut WorldState, ui: &mut UiState, kb: &InputState, renderer: &Renderer) -> Action {
    // ── Free-text prompt ──
    if let Some(text) = ui.prompt.as_mut() {
        if kb.was_pressed(KeyCode::Esc) {
            ui.prompt = None;
            return Action::Idle;
        }
        if kb.was_pressed(KeyCode::Backspace) {
            text.pop();
        }
        text.extend(kb.typed());
        if kb.was_pressed(KeyCode::Enter) {
            let choice = text.trim().to_string();
            ui.prompt = None;
            return if choice.is_empty() { Action::Idle } else { Action::Turn(choice) };
        }
        return Action::Idle;
    }

    if world.is_over() {
        return if kb.any_pressed(KEYS_QUIT) || kb.was_pressed(KeyCode::Enter) { Action::Quit } else { Action::Idle };
    }

    // ── Open container ──
    if let Some(len) = world.active_container().map(|c| c.contents.len()) {
        if kb.was_pressed(KeyCode::Esc) {
            world.close_container();
        } else if kb.any_pressed(KEYS_TAKE_ALL) {
            world.take_all();
        } else if kb.any_pressed(KEYS_TAKE) {
            let item = world.active_container().and_then(|c| c.contents.get(ui.item_cursor).cloned());
            if let Some(item) = item {
                world.take_item(&item);
            }
        } else if kb.was_pressed(KeyCode::Up) {
            ui.item_cursor = ui.item_cursor.saturating_sub(1);
        } else if kb.was_pressed(KeyCode::Down) && ui.item_cursor + 1 < len {
            ui.item_cursor += 1;
        }
        if let Some(c) = world.active_container() {
            ui.item_cursor = ui.item_cursor.min(c.contents.len().saturating_sub(1));
        }
        return Action::Idle;
    }

    // ── Clicks on the map ──
    for &(col, row) in &kb.clicks {
        if let Some(at) = renderer.grid_at(world, col, row) {
            if let Some(choice) = take_outcome(world.interact_at(at), ui) {
                return Action::Turn(choice);
            }
        }
    }

    if let Some(dir) = detect_direction(kb) {
        return take_outcome(world.attempt_move(dir), ui).map_or(Action::Idle, Action::Turn);
    }

    if kb.any_pressed(KEYS_CUSTOM) {
        ui.prompt = Some(String::new());
        return Action::Idle;
    }
    if kb.any_pressed(KEYS_QUIT) {
        return Action::Quit;
    }

    for key in &kb.presses {
        if let KeyCode::Char(c @ '1'..='9') = key.code {
            let idx = c as usize - '1' as usize;
            if let Some(opt) = world.options.get(idx) {
                return Action::Turn(opt.text.clone());
            }
        }
    }
    Action::Idle
}

fn take_outcome(outcome: MoveOutcome, ui: &mut UiState) -> Option<String> {
    match outcome {
        MoveOutcome::Choice(text) => Some(text),
        MoveOutcome::OpenContainer(_) => {
            ui.item_cursor = 0;
            None
        }
        _ => None,
    }
}

/// One full turn, redrawing as the narrative streams in.
fn play_turn(
    world: &mut WorldState,
    renderer: &mut Renderer,
    ui: &UiState,
    source: &mut dyn TurnSource,
    choice: &str,
) -> std::io::Result<()> {
    let Some(pending) = world.begin_turn(choice) else { return Ok(()) };
    tracing::info!(target: "main", "turn {}: {choice:?}", pending.request.turn);

    let mut draw_err = None;
    let result = source.request_turn(&pending.request, &mut |partial| {
        world.stream_partial(&pending, partial);
        if let Err(e) = renderer.render(world, ui) {
            draw_err.get_or_insert(e);
        }
        std::thread::sleep(STREAM_DELAY);
    });
    world.finish_turn(pending, result);

    match draw_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
