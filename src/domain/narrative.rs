/// Flavor text for a resolved local step.
///
/// Pure function of its inputs plus an injected RNG; the only random
/// decision is which template sentence to use. At most one proximity
/// clause is appended, checked in priority order:
///   1. a wall ahead, else a wall on any side → "approaching the <dir>ern wall"
///   2. a neighboring NPC the entity index resolves → "near <name>"
///   3. a neighboring object glyph → "approaching <object>"
///   4. the object glyph the player stepped onto → "standing on <object>"

use rand::Rng;

use super::entity::Entity;
use super::glyph::{self, GlyphClass};
use super::grid::{Coord, Direction, Grid};
use super::index::EntityIndex;
use super::location;

const INDOOR_TEMPLATES: &[&str] = &[
    "You step {direction} in the {room}",
    "You move {direction} across the {room}",
    "You tread {direction} through the {room}",
    "You walk {direction} in the {room}",
    "Carefully, you move {direction} in the {room}",
];

const OUTDOOR_TEMPLATES: &[&str] = &[
    "You head {direction} through the {room}",
    "You walk {direction} in the {room}",
    "You move {direction} across the {room}",
    "You proceed {direction} in the {room}",
    "You make your way {direction} through the {room}",
];

/// Everything the generator looks at. `grid` is the grid *after* the step.
pub struct StepContext<'a> {
    pub grid: &'a Grid,
    pub position: Coord,
    pub direction: Direction,
    pub location: &'a str,
    pub entities: &'a [Entity],
    /// Glyph that occupied `position` before the marker moved in.
    pub stepped_on: char,
}

pub fn step_narrative<R: Rng + ?Sized>(ctx: &StepContext<'_>, rng: &mut R) -> String {
    let templates = if location::is_outdoor(ctx.location) {
        OUTDOOR_TEMPLATES
    } else {
        INDOOR_TEMPLATES
    };
    let template = templates[rng.gen_range(0..templates.len())];
    let room = location::room_name(ctx.location);
    let room = if room.starts_with("the ") {
        room.to_string()
    } else {
        format!("the {room}")
    };
    let mut text = template
        .replace("{direction}", ctx.direction.name())
        .replace("the {room}", &room);

    if let Some(clause) = proximity_clause(ctx) {
        text.push_str(". You are now ");
        text.push_str(&clause);
    }
    text.push('.');
    text
}

fn proximity_clause(ctx: &StepContext<'_>) -> Option<String> {
    if let Some(dir) = wall_side(ctx) {
        return Some(format!("approaching the {}ern wall", dir.name()));
    }

    let index = EntityIndex::build(ctx.grid, ctx.entities);
    for dir in Direction::NEIGHBOR_ORDER {
        if let Some(npc) = ctx.grid.step(ctx.position, dir).and_then(|p| index.get(p)) {
            return Some(format!("near {}", npc.name));
        }
    }

    for dir in Direction::NEIGHBOR_ORDER {
        let name = ctx
            .grid
            .step(ctx.position, dir)
            .and_then(|p| ctx.grid.get(p))
            .and_then(glyph::object_name);
        if let Some(name) = name {
            return Some(format!("approaching {name}"));
        }
    }

    glyph::object_name(ctx.stepped_on).map(|name| format!("standing on {name}"))
}

/// Direction of the nearest wall: straight ahead first, then E, W, S, N.
fn wall_side(ctx: &StepContext<'_>) -> Option<Direction> {
    let is_wall = |dir: Direction| {
        ctx.grid
            .step(ctx.position, dir)
            .and_then(|p| ctx.grid.get(p))
            .map_or(false, |c| GlyphClass::of(c).is_wall())
    };
    if is_wall(ctx.direction) {
        return Some(ctx.direction);
    }
    Direction::NEIGHBOR_ORDER.into_iter().find(|&d| is_wall(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ctx<'a>(
        grid: &'a Grid,
        position: Coord,
        direction: Direction,
        location: &'a str,
        entities: &'a [Entity],
    ) -> StepContext<'a> {
        StepContext { grid, position, direction, location, entities, stepped_on: '.' }
    }

    #[test]
    fn wall_ahead_wins_over_side_walls() {
        let grid = Grid::parse("#####\n#.@.#\n#...#");
        let c = ctx(&grid, Coord::new(2, 1), Direction::North, "Kitchen, House", &[]);
        let text = step_narrative(&c, &mut ChaCha8Rng::seed_from_u64(1));
        assert!(text.ends_with(". You are now approaching the northern wall."), "{text}");
        assert!(text.contains("north in the Kitchen") || text.contains("north across the Kitchen")
            || text.contains("north through the Kitchen"), "{text}");
    }

    #[test]
    fn side_wall_reported_with_its_own_direction() {
        let grid = Grid::parse(".....\n...@│\n.....");
        let c = ctx(&grid, Coord::new(3, 1), Direction::South, "Hall", &[]);
        let text = step_narrative(&c, &mut ChaCha8Rng::seed_from_u64(2));
        assert!(text.ends_with("approaching the eastern wall."), "{text}");
    }

    #[test]
    fn npc_clause_uses_entity_index() {
        let grid = Grid::parse(".....\n..@B.\n.....");
        let people = vec![Entity::named("Bilal")];
        let c = ctx(&grid, Coord::new(2, 1), Direction::West, "Street of the Coppersmiths", &people);
        let text = step_narrative(&c, &mut ChaCha8Rng::seed_from_u64(3));
        assert!(text.ends_with(". You are now near Bilal."), "{text}");
    }

    #[test]
    fn object_clause_when_no_wall_or_npc() {
        let grid = Grid::parse("...\n.@○\n...");
        let c = ctx(&grid, Coord::new(1, 1), Direction::East, "Courtyard", &[]);
        let text = step_narrative(&c, &mut ChaCha8Rng::seed_from_u64(4));
        assert!(text.ends_with(". You are now approaching a well."), "{text}");
    }

    #[test]
    fn standing_on_the_glyph_stepped_onto() {
        let grid = Grid::parse("...\n.@.\n...");
        let mut c = ctx(&grid, Coord::new(1, 1), Direction::East, "Courtyard", &[]);
        c.stepped_on = '†';
        let text = step_narrative(&c, &mut ChaCha8Rng::seed_from_u64(5));
        assert!(text.ends_with(". You are now standing on a religious site."), "{text}");
    }

    #[test]
    fn bare_template_still_ends_with_period() {
        let grid = Grid::parse("...\n.@.\n...");
        let c = ctx(&grid, Coord::new(1, 1), Direction::West, "", &[]);
        let text = step_narrative(&c, &mut ChaCha8Rng::seed_from_u64(6));
        assert!(text.ends_with(" the area."), "{text}");
        assert!(!text.contains("the the"), "{text}");
        assert!(!text.contains("You are now"));
    }

    #[test]
    fn outdoor_locations_use_outdoor_templates() {
        let grid = Grid::parse("...\n.@.\n...");
        let c = ctx(&grid, Coord::new(1, 1), Direction::East, "Garden, Villa", &[]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let text = step_narrative(&c, &mut rng);
            let matched = OUTDOOR_TEMPLATES.iter().any(|t| {
                text.starts_with(&t.replace("{direction}", "east").replace("{room}", "Garden"))
            });
            assert!(matched, "{text}");
        }
    }

    #[test]
    fn same_seed_same_text() {
        let grid = Grid::parse("...\n.@.\n...");
        let c = ctx(&grid, Coord::new(1, 1), Direction::East, "Hall", &[]);
        let a = step_narrative(&c, &mut ChaCha8Rng::seed_from_u64(42));
        let b = step_narrative(&c, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
