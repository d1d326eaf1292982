/// Scene projector: the navigable scene description built from the same
/// grid and position index the 2D view uses.
///
/// The scene is pure data (materials + placed instances + click payloads);
/// a 3D backend or the terminal renderer draws it. Two consumers agree on
/// what a cell is because both classify through `domain::glyph` and
/// `domain::index`.
///
/// ## Determinism
///   seed       = FNV-1a("{location}-{tier}-{w}x{h}")
///   floor seed = seed + 7      (floor texture)
///   wall seed  = seed + 131    (wall texture)
///   wall height jitter drawn from ChaCha8 seeded with `seed`
/// Same inputs → identical scene, bit for bit.
///
/// ## Resources
///   `SceneProjector::sync` rebuilds only when its inputs changed, and
///   releases every material and instance of the previous scene first.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::domain::entity::Entity;
use crate::domain::glyph::{self, GlyphClass};
use crate::domain::grid::{Coord, Grid};
use crate::domain::index::{EntityIndex, ItemIndex, PLACEHOLDER_ITEM};
use crate::domain::location::{self, WealthTier};
use super::movement;

const WALL_HEIGHT: f32 = 1.7;
const WALL_JITTER: f32 = 0.12;

// ══════════════════════════════════════════════════════════════
// Colors and palettes
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn hex(v: u32) -> Rgb {
        Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }
}

/// Three tones of one surface: fill, highlight, and grout/shadow.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SurfacePalette {
    pub base: Rgb,
    pub accent: Rgb,
    pub shade: Rgb,
}

const fn surface(base: u32, accent: u32, shade: u32) -> SurfacePalette {
    SurfacePalette { base: Rgb::hex(base), accent: Rgb::hex(accent), shade: Rgb::hex(shade) }
}

pub fn floor_palette(tier: WealthTier) -> SurfacePalette {
    match tier {
        WealthTier::Poor => surface(0x5f4a3a, 0x7b5d49, 0x3e2d22),
        WealthTier::Modest => surface(0x7a6a5a, 0x9a846e, 0x4a3a2e),
        WealthTier::Merchant => surface(0xa28664, 0xc9a77c, 0x5a4432),
        WealthTier::Elite => surface(0xc9c1b1, 0xe6ddc8, 0x7a6f60),
    }
}

pub fn wall_palette(tier: WealthTier) -> SurfacePalette {
    match tier {
        WealthTier::Poor => surface(0x6f5540, 0x8a6a52, 0x3b2b20),
        WealthTier::Modest => surface(0x8b7560, 0xb49778, 0x4b3b2e),
        WealthTier::Merchant => surface(0xb59a78, 0xd0b48b, 0x5d4734),
        WealthTier::Elite => surface(0xd9d2c5, 0xf0e7d7, 0x807468),
    }
}

// ══════════════════════════════════════════════════════════════
// Scene data
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Primitive {
    Floor,
    Wall,
    HeavyWall,
    Water,
    Carpet,
    Decor,
    Door,
    Exit,
    Container,
    Interactable,
    Landmark,
    Npc,
    Player,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Material {
    pub kind: Primitive,
    pub color: Rgb,
    pub roughness: f32,
}

/// Click payload of an interactive instance.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Interaction {
    Exit { label: Option<String> },
    Container { at: Coord },
    Npc { name: String },
    Item { label: String },
    Player { name: String },
}

impl Interaction {
    /// Tooltip text for pointer hover.
    pub fn hover_text(&self) -> String {
        match self {
            Interaction::Exit { label: Some(l) } => format!("Exit: {l}"),
            Interaction::Exit { label: None } => "Exit".to_string(),
            Interaction::Container { .. } => "Container".to_string(),
            Interaction::Npc { name } => name.clone(),
            Interaction::Item { label } => label.clone(),
            Interaction::Player { name } => format!("You ({name})"),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Instance {
    pub at: Coord,
    pub glyph: char,
    pub kind: Primitive,
    pub height: f32,
    pub interaction: Option<Interaction>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Scene {
    pub width: usize,
    pub height: usize,
    pub tier: WealthTier,
    pub outdoor: bool,
    pub seed: u32,
    pub floor_seed: u32,
    pub wall_seed: u32,
    /// One per primitive kind present, floor always first.
    pub materials: Vec<Material>,
    /// Row-major.
    pub instances: Vec<Instance>,
}

impl Scene {
    pub fn material(&self, kind: Primitive) -> Option<&Material> {
        self.materials.iter().find(|m| m.kind == kind)
    }

    pub fn instance_at(&self, at: Coord) -> Option<&Instance> {
        self.instances.iter().find(|i| i.at == at)
    }

    /// Interaction under a clicked cell.
    pub fn pick(&self, at: Coord) -> Option<&Interaction> {
        self.instance_at(at).and_then(|i| i.interaction.as_ref())
    }

    fn resource_count(&self) -> usize {
        self.materials.len() + self.instances.len()
    }
}

/// Everything a scene is built from.
pub struct SceneInput<'a> {
    pub grid: &'a Grid,
    pub entities: &'a [Entity],
    pub interactables: &'a [String],
    pub location: &'a str,
    pub tier: WealthTier,
    pub player_name: &'a str,
}

// ══════════════════════════════════════════════════════════════
// Building
// ══════════════════════════════════════════════════════════════

/// 32-bit FNV-1a over UTF-16 code units.
pub fn fnv1a(text: &str) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    for unit in text.encode_utf16() {
        h ^= u32::from(unit);
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}

pub fn scene_seed(location: &str, tier: WealthTier, width: usize, height: usize) -> u32 {
    fnv1a(&format!("{location}-{}-{width}x{height}", tier.as_str()))
}

pub fn build_scene(input: &SceneInput<'_>) -> Scene {
    let grid = input.grid;
    let outdoor = location::is_outdoor(input.location);
    let seed = scene_seed(input.location, input.tier, grid.width(), grid.height());
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));

    let entities = EntityIndex::build(grid, input.entities);
    let items = ItemIndex::build(grid, input.interactables);

    let mut instances = vec![];
    for (at, ch) in grid.cells() {
        let Some(kind) = primitive_for(ch, at, &entities) else { continue };

        let height = match kind {
            Primitive::Wall | Primitive::HeavyWall => {
                WALL_HEIGHT + rng.gen_range(-WALL_JITTER..=WALL_JITTER)
            }
            other => base_height(other),
        };

        let interaction = match kind {
            Primitive::Exit => Some(Interaction::Exit { label: movement::exit_label(grid, at) }),
            Primitive::Container => Some(Interaction::Container { at }),
            Primitive::Interactable => Some(Interaction::Item {
                label: items.get(at).unwrap_or(PLACEHOLDER_ITEM).to_string(),
            }),
            Primitive::Npc => entities.get(at).map(|e| Interaction::Npc { name: e.name.clone() }),
            Primitive::Player => Some(Interaction::Player { name: input.player_name.to_string() }),
            _ => None,
        };

        instances.push(Instance { at, glyph: ch, kind, height, interaction });
    }

    let mut kinds: Vec<Primitive> = instances.iter().map(|i| i.kind).collect();
    kinds.push(Primitive::Floor);
    kinds.sort();
    kinds.dedup();
    let materials = kinds
        .into_iter()
        .map(|kind| material_for(kind, input.tier, outdoor))
        .collect();

    Scene {
        width: grid.width(),
        height: grid.height(),
        tier: input.tier,
        outdoor,
        seed,
        floor_seed: seed.wrapping_add(7),
        wall_seed: seed.wrapping_add(131),
        materials,
        instances,
    }
}

fn primitive_for(ch: char, at: Coord, entities: &EntityIndex<'_>) -> Option<Primitive> {
    let kind = match GlyphClass::of(ch) {
        GlyphClass::Structure if glyph::is_heavy_wall(ch) => Primitive::HeavyWall,
        GlyphClass::Structure => Primitive::Wall,
        GlyphClass::Water => Primitive::Water,
        GlyphClass::Decor if ch == '≋' => Primitive::Carpet,
        GlyphClass::Decor => Primitive::Decor,
        GlyphClass::Door => Primitive::Door,
        GlyphClass::Exit => Primitive::Exit,
        GlyphClass::Container => Primitive::Container,
        GlyphClass::Interactable => Primitive::Interactable,
        GlyphClass::Landmark => Primitive::Landmark,
        GlyphClass::Npc if entities.get(at).is_some() => Primitive::Npc,
        GlyphClass::Player => Primitive::Player,
        _ => return None,
    };
    Some(kind)
}

fn base_height(kind: Primitive) -> f32 {
    match kind {
        Primitive::Door => 1.2,
        Primitive::Exit => 1.6,
        Primitive::Container => 0.5,
        Primitive::Interactable => 0.58,
        Primitive::Landmark => 1.0,
        Primitive::Npc => 0.93,
        Primitive::Player => 1.05,
        Primitive::Decor => 0.45,
        _ => 0.0,
    }
}

fn material_for(kind: Primitive, tier: WealthTier, outdoor: bool) -> Material {
    let floor = floor_palette(tier);
    let wall = wall_palette(tier);
    let elite = tier == WealthTier::Elite;
    let (color, roughness) = match kind {
        Primitive::Floor => (floor.base, if outdoor { 0.95 } else { 0.75 }),
        Primitive::Wall => (wall.base, 0.85),
        Primitive::HeavyWall => (wall.shade, 0.9),
        Primitive::Water => (Rgb::hex(if outdoor { 0x3c6e8f } else { 0x2f566b }), 0.35),
        Primitive::Carpet => (Rgb::hex(if elite { 0x7d2f2f } else { 0x6b3f2a }), 0.8),
        Primitive::Decor => (Rgb::hex(if elite { 0xd2b06a } else { 0x8d6a3b }), 0.6),
        Primitive::Door => (wall.accent, 0.6),
        Primitive::Exit => (wall.accent, 0.5),
        Primitive::Container => (Rgb::hex(0x6b4a2f), 0.7),
        Primitive::Interactable => (Rgb::hex(0xe6d398), 0.4),
        Primitive::Landmark => (Rgb::hex(0x85715b), 0.8),
        Primitive::Npc => (Rgb::hex(0x6f8bbd), 0.6),
        Primitive::Player => (Rgb::hex(0xb5522f), 0.5),
    };
    Material { kind, color, roughness }
}

// ══════════════════════════════════════════════════════════════
// Projector
// ══════════════════════════════════════════════════════════════

/// Running totals of scene resources. `live` is what the current scene holds.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct ResourceStats {
    pub built: usize,
    pub released: usize,
    pub live: usize,
    pub rebuilds: usize,
}

/// Inputs that decide whether the scene must be rebuilt.
#[derive(Clone, PartialEq, Eq, Debug)]
struct SceneKey {
    grid: String,
    entities: Vec<String>,
    interactables: Vec<String>,
    location: String,
    tier: WealthTier,
    player_name: String,
}

impl SceneKey {
    fn of(input: &SceneInput<'_>) -> Self {
        SceneKey {
            grid: input.grid.to_string(),
            entities: input.entities.iter().map(|e| e.name.clone()).collect(),
            interactables: input.interactables.to_vec(),
            location: input.location.to_string(),
            tier: input.tier,
            player_name: input.player_name.to_string(),
        }
    }
}

#[derive(Default)]
pub struct SceneProjector {
    scene: Option<Scene>,
    key: Option<SceneKey>,
    stats: ResourceStats,
}

impl SceneProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn stats(&self) -> ResourceStats {
        self.stats
    }

    /// Rebuild if any input changed. Returns `true` when a new scene was built.
    pub fn sync(&mut self, input: &SceneInput<'_>) -> bool {
        let key = SceneKey::of(input);
        if self.key.as_ref() == Some(&key) {
            return false;
        }

        self.release();
        let scene = build_scene(input);
        let count = scene.resource_count();
        self.stats.built += count;
        self.stats.live = count;
        self.stats.rebuilds += 1;
        tracing::debug!(
            target: "scene",
            "rebuilt scene {}x{} seed={:#010x} resources={count}",
            scene.width, scene.height, scene.seed
        );
        self.scene = Some(scene);
        self.key = Some(key);
        true
    }

    /// Drop the current scene and everything it holds.
    pub fn release(&mut self) {
        if let Some(old) = self.scene.take() {
            self.stats.released += old.resource_count();
        }
        self.stats.live = 0;
        self.key = None;
    }
}
