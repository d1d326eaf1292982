/// Entities, containers and their closed vocabularies.
///
/// The turn collaborator owns these records; the engine only reads them.
/// Raw strings coming from the collaborator are cleaned into closed enums:
/// the text before the first '/', ',' or '(' is trimmed and lowercased,
/// and anything unknown falls back to a neutral value.

use super::grid::Coord;

/// Leading token of a free-form field ("Sick / feverish" → "sick").
fn clean_token(raw: &str) -> String {
    raw.split(&['/', ',', '('][..])
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Healthy,
    Sick,
    Dead,
    Active,
    Idle,
    Resting,
    Missing,
    Fled,
}

impl Status {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(clean_token).as_deref() {
            Some("healthy") => Status::Healthy,
            Some("sick") => Status::Sick,
            Some("dead") => Status::Dead,
            Some("idle") => Status::Idle,
            Some("resting") => Status::Resting,
            Some("missing") => Status::Missing,
            Some("fled") => Status::Fled,
            _ => Status::Active,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    Spouse,
    Child,
    Servant,
    Guard,
    Merchant,
    Neighbor,
    Parent,
    Sibling,
    Stranger,
}

impl Role {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(clean_token).as_deref() {
            Some("spouse") => Role::Spouse,
            Some("child") => Role::Child,
            Some("servant") => Role::Servant,
            Some("guard") => Role::Guard,
            Some("merchant") => Role::Merchant,
            Some("neighbor") => Role::Neighbor,
            Some("parent") => Role::Parent,
            Some("sibling") => Role::Sibling,
            _ => Role::Stranger,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Condition {
    Healthy,
    Incubating,
    Symptomatic,
    Dying,
    Corpse,
}

impl Condition {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(clean_token).as_deref() {
            Some("incubating") => Condition::Incubating,
            Some("symptomatic") => Condition::Symptomatic,
            Some("dying") => Condition::Dying,
            Some("corpse") => Condition::Corpse,
            _ => Condition::Healthy,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Activity {
    Standing,
    Praying,
    Walking,
    Working,
    Resting,
    Fleeing,
    Trading,
}

impl Activity {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(clean_token).as_deref() {
            Some("praying") => Activity::Praying,
            Some("walking") => Activity::Walking,
            Some("working") => Activity::Working,
            Some("resting") => Activity::Resting,
            Some("fleeing") => Activity::Fleeing,
            Some("trading") => Activity::Trading,
            _ => Activity::Standing,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Entity {
    pub name: String,
    pub status: Status,
    pub role: Role,
    pub condition: Condition,
    pub activity: Activity,
}

impl Entity {
    /// Entity with neutral fields. Mostly used by tests and fixtures.
    pub fn named(name: &str) -> Self {
        Entity {
            name: name.to_string(),
            status: Status::Active,
            role: Role::Stranger,
            condition: Condition::Healthy,
            activity: Activity::Standing,
        }
    }

    /// Uppercase first letter of the name: the glyph that anchors it on the map.
    pub fn initial(&self) -> Option<char> {
        self.name.trim().chars().next().map(|c| c.to_ascii_uppercase())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContainerKind {
    Chest,
    Jar,
    Sack,
    Box,
}

impl ContainerKind {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(clean_token).as_deref() {
            Some("chest") => ContainerKind::Chest,
            Some("jar") => ContainerKind::Jar,
            Some("sack") => ContainerKind::Sack,
            _ => ContainerKind::Box,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub kind: ContainerKind,
    pub symbol: char,
    pub contents: Vec<String>,
    /// Grid coordinate after crop-offset correction.
    pub at: Coord,
    pub searched: bool,
}

impl Container {
    /// Remove one item by name. Marks the container searched either way.
    pub fn take(&mut self, item: &str) -> Option<String> {
        self.searched = true;
        let idx = self.contents.iter().position(|c| c == item)?;
        Some(self.contents.remove(idx))
    }

    /// Empty the container, returning everything it held.
    pub fn take_all(&mut self) -> Vec<String> {
        self.searched = true;
        std::mem::take(&mut self.contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_fields_keep_leading_token() {
        assert_eq!(Status::from_raw(Some("Sick / feverish")), Status::Sick);
        assert_eq!(Role::from_raw(Some(" Guard (city watch)")), Role::Guard);
        assert_eq!(Condition::from_raw(Some("dying, slowly")), Condition::Dying);
        assert_eq!(Activity::from_raw(Some("PRAYING")), Activity::Praying);
    }

    #[test]
    fn unknown_or_missing_values_fall_back() {
        assert_eq!(Status::from_raw(Some("alive")), Status::Active);
        assert_eq!(Role::from_raw(None), Role::Stranger);
        assert_eq!(Condition::from_raw(Some("")), Condition::Healthy);
        assert_eq!(Activity::from_raw(Some("haggling")), Activity::Standing);
        assert_eq!(ContainerKind::from_raw(Some("crate")), ContainerKind::Box);
    }

    #[test]
    fn initial_is_uppercase_first_letter() {
        assert_eq!(Entity::named("  bilal").initial(), Some('B'));
        assert_eq!(Entity::named("").initial(), None);
    }

    #[test]
    fn taking_items_marks_searched() {
        let mut c = Container {
            id: "c1".into(),
            name: "Chest".into(),
            kind: ContainerKind::Chest,
            symbol: '▪',
            contents: vec!["Bread".into(), "Knife".into()],
            at: Coord::new(1, 1),
            searched: false,
        };
        assert_eq!(c.take("Knife"), Some("Knife".to_string()));
        assert!(c.searched);
        assert_eq!(c.take("Knife"), None);
        assert_eq!(c.take_all(), vec!["Bread".to_string()]);
        assert!(c.contents.is_empty());
    }
}
