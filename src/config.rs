/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD, or the
/// XDG/system data dirs). Falls back to sensible defaults if the file is
/// missing, unreadable or incomplete.
///
/// ```toml
/// [general]
/// turns_dir = "turns"      # *.json turn scripts; first one is played
///
/// [player]
/// name = "Yusuf"
///
/// [narrative]
/// seed = 1348              # fixed RNG seed; omit for a random one
///
/// [log]
/// file = "glyphmap.log"
/// level = "info"           # overridden by RUST_LOG
/// ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const APP_DIR: &str = "glyphmap";

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub turns_dir: PathBuf,
    pub player_name: String,
    pub narrative_seed: Option<u64>,
    pub log: LogConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogConfig {
    pub file: PathBuf,
    pub level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    narrative: TomlNarrative,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_turns_dir")]
    turns_dir: String,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_player_name")]
    name: String,
}

#[derive(Deserialize, Debug, Default)]
struct TomlNarrative {
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_turns_dir() -> String { "turns".into() }
fn default_player_name() -> String { "Traveler".into() }
fn default_log_file() -> String { "glyphmap.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { turns_dir: default_turns_dir() }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer { name: default_player_name() }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog { file: default_log_file(), level: default_log_level() }
    }
}

// ── Loading ──

impl AppConfig {
    /// Load config from `config.toml`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = match find_config(&search_dirs) {
            Some(path) => match read_toml(&path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("Warning: {e}");
                    eprintln!("Using default settings.");
                    TomlConfig::default()
                }
            },
            None => TomlConfig::default(),
        };
        Self::resolve(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no file search). Relative paths stay relative.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg = toml::from_str::<TomlConfig>(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Ok(Self::resolve(cfg, &[]))
    }

    fn resolve(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let name = cfg.player.name.trim();
        AppConfig {
            turns_dir: resolve_dir(&cfg.general.turns_dir, search_dirs),
            player_name: if name.is_empty() { default_player_name() } else { name.to_string() },
            narrative_seed: cfg.narrative.seed,
            log: LogConfig {
                file: PathBuf::from(cfg.log.file),
                level: cfg.log.level,
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::resolve(TomlConfig::default(), &[])
    }
}

/// Absolute paths as-is; relative ones are looked up in the candidate dirs.
fn resolve_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        return path;
    }
    search_dirs
        .iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share").join(APP_DIR);
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share").join(APP_DIR);
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn find_config(search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs.iter().map(|d| d.join("config.toml")).find(|p| p.exists())
}

fn read_toml(path: &Path) -> Result<TomlConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.turns_dir, PathBuf::from("turns"));
        assert_eq!(cfg.player_name, "Traveler");
        assert_eq!(cfg.narrative_seed, None);
        assert_eq!(cfg.log.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_toml_str(
            "[player]\nname = \"Yusuf\"\n\n[narrative]\nseed = 1348\n\n[log]\nlevel = \"debug\"\n",
        )
        .unwrap();
        assert_eq!(cfg.player_name, "Yusuf");
        assert_eq!(cfg.narrative_seed, Some(1348));
        assert_eq!(cfg.log.level, "debug");
        assert_eq!(cfg.log.file, PathBuf::from("glyphmap.log"));
    }

    #[test]
    fn blank_player_name_falls_back() {
        let cfg = AppConfig::from_toml_str("[player]\nname = \"   \"\n").unwrap();
        assert_eq!(cfg.player_name, "Traveler");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let err = AppConfig::from_toml_str("[player\nname=").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn absolute_dirs_are_kept() {
        let cfg = AppConfig::from_toml_str("[general]\nturns_dir = \"/srv/turns\"\n").unwrap();
        assert_eq!(cfg.turns_dir, PathBuf::from("/srv/turns"));
    }
}
