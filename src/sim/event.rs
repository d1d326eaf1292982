/// Outcomes emitted by the movement resolver and scene clicks.
/// The session turns these into log entries or turn requests.

use crate::domain::grid::Coord;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing happened: no locatable player, or a container glyph
    /// with no container behind it.
    Ignored,
    /// Consequential move; the text goes to the turn collaborator.
    Choice(String),
    /// Index into the session's container list.
    OpenContainer(usize),
    Blocked,
    /// Local step already applied to the grid.
    Stepped { from: Coord, to: Coord, narrative: String },
}

impl MoveOutcome {
    pub fn choice(text: impl Into<String>) -> Self {
        MoveOutcome::Choice(text.into())
    }

    /// Does this outcome need a full turn?
    pub fn is_choice(&self) -> bool {
        matches!(self, MoveOutcome::Choice(_))
    }
}

// ── Choice texts ──
// Shared by the grid resolver and the scene click path so both emit
// identical strings for the same cell.

pub const LEAVE_AREA: &str = "Leave the area";
pub const THROUGH_DOORWAY: &str = "Move through the doorway";

pub fn approach(name: &str) -> String {
    format!("Approach {name}")
}

pub fn inspect(label: &str) -> String {
    format!("Inspect the {label}")
}

/// "Go to <label>", or "Leave the area" for an unlabeled exit.
pub fn go_to(label: Option<&str>) -> String {
    match label {
        Some(l) if !l.is_empty() => format!("Go to {l}"),
        _ => LEAVE_AREA.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlabeled_exit_reads_like_leaving() {
        assert_eq!(go_to(None), LEAVE_AREA);
        assert_eq!(go_to(Some("")), LEAVE_AREA);
        assert_eq!(go_to(Some("SOUK")), "Go to SOUK");
    }

    #[test]
    fn only_choices_need_a_turn() {
        assert!(MoveOutcome::choice(approach("Bilal")).is_choice());
        assert!(!MoveOutcome::Blocked.is_choice());
        assert!(!MoveOutcome::OpenContainer(0).is_choice());
    }
}
