/// Glyph legend: the single glyph → category table.
///
/// Every consumer (normalizer, position index, movement resolver,
/// narrative, scene projector, terminal renderer) asks this module what a
/// character means. Semantics are queried via methods, not stored as
/// flags, so the legend lives in exactly one place.
///
/// ## Legend
///   '@'               = Player marker (exactly one per grid)
///   'A'-'Z'           = NPC anchor (first letter of entity name)
///   '*' '$' '!' '?'   = Interactable markers
///   '▪' '◎'           = Containers
///   '►' '◄' '▲' '▼' '⇨' '◀' = Exits
///   '+'               = Door
///   '#' '|' '-' '_' '=' box-drawing '▓' '▒' '⌂' = Structure (blocks)
///   '◙' '○' '●'       = Landmarks: fountain, well, tree (block)
///   '~' '≈'           = Water
///   '≋' '◊' '░' '▫' '†' = Decor
///   ' ' '.' ',' '╱' '╲' '═' '║' = Ground / paths
///   '[' ... ']'       = Zone label span (grid-level, see `grid::label_spans`)

pub const PLAYER: char = '@';

pub const INTERACTABLE_GLYPHS: &[char] = &['*', '$', '!', '?'];
pub const CONTAINER_GLYPHS: &[char] = &['▪', '◎'];
pub const EXIT_GLYPHS: &[char] = &['►', '◄', '▲', '▼', '⇨', '◀'];
pub const DOOR_GLYPHS: &[char] = &['+'];
pub const STRUCTURE_GLYPHS: &[char] = &[
    '#', '|', '-', '_', '=',
    '┌', '┐', '└', '┘', '─', '│', '├', '┤', '┬', '┴', '┼',
    '▓', '▒', '⌂',
];
pub const LANDMARK_GLYPHS: &[char] = &['◙', '○', '●'];
pub const WATER_GLYPHS: &[char] = &['~', '≈'];
pub const DECOR_GLYPHS: &[char] = &['≋', '◊', '░', '▫', '†'];
pub const GROUND_GLYPHS: &[char] = &[' ', '.', ',', '╱', '╲', '═', '║'];

/// Terrain the player marker may stand on and leave behind when it moves.
pub const UNDERFOOT_TERRAIN: &[char] = &[
    ' ', '.', ',', '~', '≈', '≋', '░', '◊', '╱', '╲', '═', '║',
];

/// Label bracket characters. Not a category of their own: a bracket only
/// means something when it closes a span on the same row.
pub const LABEL_OPEN: char = '[';
pub const LABEL_CLOSE: char = ']';

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum GlyphClass {
    Player,
    Npc,
    Interactable,
    Container,
    Exit,
    Door,
    Structure,
    Landmark,
    Water,
    Decor,
    Ground,
    Other,
}

impl GlyphClass {
    /// Classify a single character. Context-free: label spans are excluded
    /// by the caller via `grid::label_spans`.
    pub fn of(ch: char) -> GlyphClass {
        if ch == PLAYER {
            GlyphClass::Player
        } else if ch.is_ascii_uppercase() {
            GlyphClass::Npc
        } else if INTERACTABLE_GLYPHS.contains(&ch) {
            GlyphClass::Interactable
        } else if CONTAINER_GLYPHS.contains(&ch) {
            GlyphClass::Container
        } else if EXIT_GLYPHS.contains(&ch) {
            GlyphClass::Exit
        } else if DOOR_GLYPHS.contains(&ch) {
            GlyphClass::Door
        } else if STRUCTURE_GLYPHS.contains(&ch) {
            GlyphClass::Structure
        } else if LANDMARK_GLYPHS.contains(&ch) {
            GlyphClass::Landmark
        } else if WATER_GLYPHS.contains(&ch) {
            GlyphClass::Water
        } else if DECOR_GLYPHS.contains(&ch) {
            GlyphClass::Decor
        } else if GROUND_GLYPHS.contains(&ch) {
            GlyphClass::Ground
        } else {
            GlyphClass::Other
        }
    }

    /// Does this glyph stop the player outright?
    pub fn blocks_movement(self) -> bool {
        matches!(self, GlyphClass::Structure | GlyphClass::Landmark)
    }

    /// Is this a wall for narrative purposes? Landmarks block but are not walls.
    pub fn is_wall(self) -> bool {
        matches!(self, GlyphClass::Structure)
    }

    /// Can clicking / stepping into this glyph defer to the turn collaborator?
    pub fn is_interactive(self) -> bool {
        matches!(
            self,
            GlyphClass::Npc
                | GlyphClass::Interactable
                | GlyphClass::Container
                | GlyphClass::Exit
                | GlyphClass::Door
        )
    }
}

/// Should this terrain be cached as the player's underfoot glyph?
pub fn keeps_underfoot(ch: char) -> bool {
    UNDERFOOT_TERRAIN.contains(&ch)
}

/// Heavy masonry renders differently from indoor walls.
pub fn is_heavy_wall(ch: char) -> bool {
    matches!(ch, '▓' | '▒')
}

/// Human name for glyphs the narrative mentions ("approaching a well").
pub fn object_name(ch: char) -> Option<&'static str> {
    let name = match ch {
        '*' => "something of interest",
        '$' => "valuables",
        '!' => "something dangerous",
        '?' => "something curious",
        '▪' => "a chest",
        '◎' => "a jar",
        '►' | '◄' | '▲' | '▼' | '⇨' | '◀' => "an exit",
        '+' => "a doorway",
        '◙' => "a fountain",
        '○' => "a well",
        '●' => "a tree",
        '†' => "a religious site",
        _ => return None,
    };
    Some(name)
}
