/// Turn collaborator seam: payload types and turn sources.
///
/// ## Payload (JSON, camelCase, every field optional)
///   narrative, localMapAscii, presentEntities, presentInteractables,
///   presentContainers, newLocation, locationWealth, options,
///   updatedHealth, updatedInventory, gameStatus, isGameOver
///
/// ## Sources (priority order):
///   1. `turns_dir/*.json`: first script in file-name order
///   2. Built-in embedded demo script
///
/// ## Script format:
///   ```json
///   { "name": "...",
///     "opening":   { <payload> },
///     "responses": [ { "choice": "Go to SOUK", "turn": { <payload> } } ],
///     "fallback":  { <payload> } }
///   ```
/// Choices match case-insensitively after trimming. A choice with no
/// response uses `fallback`; without one the request fails.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TurnError;

const EMBEDDED_SCRIPT: &str = include_str!("../../assets/demo_turns.json");

// ══════════════════════════════════════════════════════════════
// Payload
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnPayload {
    pub narrative: String,
    pub local_map_ascii: String,
    pub present_entities: Vec<RawEntity>,
    pub present_interactables: Vec<String>,
    /// `None` = not sent; the previous containers stay in place.
    pub present_containers: Option<Vec<RawContainer>>,
    pub new_location: Option<String>,
    pub location_wealth: Option<String>,
    pub options: Vec<GameOption>,
    pub updated_health: Option<i64>,
    pub updated_inventory: Option<Vec<String>>,
    pub game_status: Option<String>,
    pub is_game_over: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEntity {
    pub name: String,
    pub status: Option<String>,
    pub role: Option<String>,
    pub condition: Option<String>,
    pub activity: Option<String>,
}

/// Container as sent: absolute, uncropped source coordinates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawContainer {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub symbol: Option<String>,
    pub contents: Vec<String>,
    pub x: i64,
    pub y: i64,
    pub searched: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOption {
    pub id: u32,
    pub text: String,
}

impl GameOption {
    pub fn new(id: u32, text: &str) -> Self {
        GameOption { id, text: text.to_string() }
    }
}

/// What the session sends for one full turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub choice: String,
    pub turn: u32,
    pub location: String,
    pub health: u8,
    pub inventory: Vec<String>,
}

// ══════════════════════════════════════════════════════════════
// TurnSource
// ══════════════════════════════════════════════════════════════

/// The external producer of turns. `on_partial` receives the narrative
/// accumulated so far while the turn is being produced.
pub trait TurnSource {
    fn opening(&mut self) -> Result<TurnPayload, TurnError>;

    fn request_turn(
        &mut self,
        request: &TurnRequest,
        on_partial: &mut dyn FnMut(&str),
    ) -> Result<TurnPayload, TurnError>;
}

#[derive(Clone, Debug, Deserialize)]
struct TurnScript {
    #[serde(default)]
    name: String,
    #[serde(default)]
    opening: TurnPayload,
    #[serde(default)]
    responses: Vec<ScriptedResponse>,
    #[serde(default)]
    fallback: Option<TurnPayload>,
}

#[derive(Clone, Debug, Deserialize)]
struct ScriptedResponse {
    choice: String,
    turn: TurnPayload,
}

/// Plays a fixed JSON script.
#[derive(Clone, Debug)]
pub struct ScriptedTurns {
    script: TurnScript,
}

impl ScriptedTurns {
    pub fn from_json(text: &str, origin: &str) -> Result<Self, TurnError> {
        let script = serde_json::from_str(text).map_err(|source| TurnError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        Ok(ScriptedTurns { script })
    }

    pub fn from_path(path: &Path) -> Result<Self, TurnError> {
        let text = std::fs::read_to_string(path).map_err(|source| TurnError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, &path.display().to_string())
    }

    pub fn embedded() -> Result<Self, TurnError> {
        Self::from_json(EMBEDDED_SCRIPT, "<embedded>")
    }

    /// First script in `dir`, or the embedded demo when there is none or it
    /// does not load.
    pub fn load_or_embedded(dir: &Path) -> Result<Self, TurnError> {
        if let Some(path) = scan_scripts(dir).into_iter().next() {
            match Self::from_path(&path) {
                Ok(s) => {
                    tracing::info!(target: "turns", "playing script {}", path.display());
                    return Ok(s);
                }
                Err(e) => tracing::warn!(target: "turns", "{e}; using embedded demo"),
            }
        }
        Self::embedded()
    }

    pub fn name(&self) -> &str {
        &self.script.name
    }

    fn response_for(&self, choice: &str) -> Option<&TurnPayload> {
        let wanted = choice.trim();
        self.script
            .responses
            .iter()
            .find(|r| r.choice.trim().eq_ignore_ascii_case(wanted))
            .map(|r| &r.turn)
            .or(self.script.fallback.as_ref())
    }
}

impl TurnSource for ScriptedTurns {
    fn opening(&mut self) -> Result<TurnPayload, TurnError> {
        Ok(self.script.opening.clone())
    }

    fn request_turn(
        &mut self,
        request: &TurnRequest,
        on_partial: &mut dyn FnMut(&str),
    ) -> Result<TurnPayload, TurnError> {
        let payload = self
            .response_for(&request.choice)
            .cloned()
            .ok_or_else(|| TurnError::NoResponse { choice: request.choice.clone() })?;

        let mut streamed = String::new();
        for word in payload.narrative.split_whitespace() {
            if !streamed.is_empty() {
                streamed.push(' ');
            }
            streamed.push_str(word);
            on_partial(&streamed);
        }
        Ok(payload)
    }
}

/// `*.json` files in `dir`, sorted by file name. Missing dir → empty.
pub fn scan_scripts(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |x| x == "json"))
            .collect(),
        Err(_) => vec![],
    };
    files.sort();
    files
}
