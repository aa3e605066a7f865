// Difficulty table and the persisted settings document
// Settings are read once at startup and written back at shutdown

use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::cs_error::SettingsError;

pub const ROWS_RANGE: (usize, usize) = (5, 30);
pub const COLS_RANGE: (usize, usize) = (5, 40);
pub const TIME_LIMIT_RANGE: (u64, u64) = (10, 999);

/// Mine density presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Brutal,
}

impl Serialize for Difficulty {
    /// Stored as the upper-case name, matching what players type in the file
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    /// Unknown names fall back to NORMAL instead of rejecting the whole document
    fn deserialize<D>(deserializer: D) -> Result<Difficulty, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Difficulty::parse(&s).unwrap_or_else(|| {
            warn!(value = %s, "unknown difficulty in settings, using NORMAL");
            Difficulty::Normal
        }))
    }
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Brutal,
    ];

    /// Fraction of the board area covered by mines
    pub fn density(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.08,
            Difficulty::Normal => 0.12,
            Difficulty::Hard => 0.17,
            Difficulty::Brutal => 0.25,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Normal => "NORMAL",
            Difficulty::Hard => "HARD",
            Difficulty::Brutal => "BRUTAL",
        }
    }

    /// Accepts full names or initials in any case
    pub fn parse(s: &str) -> Option<Difficulty> {
        match s.trim().to_uppercase().as_str() {
            "E" | "EASY" => Some(Difficulty::Easy),
            "N" | "NORMAL" => Some(Difficulty::Normal),
            "H" | "HARD" => Some(Difficulty::Hard),
            "B" | "BRUTAL" => Some(Difficulty::Brutal),
            _ => None,
        }
    }

    /// Resolve the density into a mine count for a rows x cols board
    pub fn mine_count(&self, rows: usize, cols: usize) -> usize {
        ((rows * cols) as f64 * self.density()).floor() as usize
    }

    pub fn next(&self) -> Difficulty {
        let i = Difficulty::ALL.iter().position(|d| d == self).unwrap_or(0);
        Difficulty::ALL[(i + 1) % Difficulty::ALL.len()]
    }

    pub fn prev(&self) -> Difficulty {
        let i = Difficulty::ALL.iter().position(|d| d == self).unwrap_or(0);
        Difficulty::ALL[(i + Difficulty::ALL.len() - 1) % Difficulty::ALL.len()]
    }
}

/// Settings document, persisted as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub difficulty: Difficulty,
    pub colours: bool,    // Colour the board symbols
    pub time_trial: bool, // Lose when time_limit runs out
    pub time_limit: u64,  // Seconds
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            grid_rows: 12,
            grid_cols: 12,
            difficulty: Difficulty::Normal,
            colours: true,
            time_trial: false,
            time_limit: 100,
        }
    }
}

impl Settings {
    /// Parse a settings document; anything malformed yields the defaults
    pub fn from_toml_str(s: &str) -> Settings {
        match toml::from_str::<Settings>(s) {
            Ok(mut settings) => {
                settings.clamp();
                settings
            }
            Err(e) => {
                warn!(error = %e, "malformed settings, using defaults");
                Settings::default()
            }
        }
    }

    /// Keep values inside the ranges the front ends can display
    pub fn clamp(&mut self) {
        let before = self.clone();
        self.grid_rows = self.grid_rows.clamp(ROWS_RANGE.0, ROWS_RANGE.1);
        self.grid_cols = self.grid_cols.clamp(COLS_RANGE.0, COLS_RANGE.1);
        self.time_limit = self.time_limit.clamp(TIME_LIMIT_RANGE.0, TIME_LIMIT_RANGE.1);
        if *self != before {
            warn!(?before, after = ?self, "settings out of range, clamped");
        }
    }

    pub fn mine_count(&self) -> usize {
        self.difficulty.mine_count(self.grid_rows, self.grid_cols)
    }

    /// Read settings from `path`; a missing or unreadable file yields the defaults
    pub fn load(path: &Path) -> Settings {
        match fs::read_to_string(path) {
            Ok(s) => {
                debug!(path = %path.display(), "settings loaded");
                Settings::from_toml_str(&s)
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no settings file, using defaults");
                Settings::default()
            }
        }
    }

    /// Write settings to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let s = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, s)?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }
}

/// Directory holding the settings file and the log.
/// Uses the platform config directory (e.g. ~/.config/cursedsweeper on Linux),
/// falling back to the current directory.
pub fn data_dir() -> Option<PathBuf> {
    if let Some(proj) = ProjectDirs::from("com", "cursedsweeper", "cursedsweeper") {
        return Some(proj.config_dir().to_path_buf());
    }
    env::current_dir().ok()
}

/// Default location of the settings file
pub fn settings_path() -> Option<PathBuf> {
    data_dir().map(|mut p| {
        p.push("settings.toml");
        p
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_table() {
        assert_eq!(Difficulty::Easy.mine_count(10, 10), 8);
        assert_eq!(Difficulty::Normal.mine_count(12, 12), 17);
        assert_eq!(Difficulty::Hard.mine_count(10, 10), 17);
        assert_eq!(Difficulty::Brutal.mine_count(20, 20), 100);
    }

    #[test]
    fn difficulty_parse_accepts_initials() {
        assert_eq!(Difficulty::parse("e"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse(" Brutal "), Some(Difficulty::Brutal));
        assert_eq!(Difficulty::parse("hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("impossible"), None);
    }

    #[test]
    fn difficulty_cycles() {
        assert_eq!(Difficulty::Brutal.next(), Difficulty::Easy);
        assert_eq!(Difficulty::Easy.prev(), Difficulty::Brutal);
        assert_eq!(Difficulty::Normal.next(), Difficulty::Hard);
    }

    #[test]
    fn parses_full_document() {
        let s = r#"
grid_rows = 16
grid_cols = 20
difficulty = "hard"
colours = false
time_trial = true
time_limit = 250
"#;
        let settings = Settings::from_toml_str(s);
        assert_eq!(
            settings,
            Settings {
                grid_rows: 16,
                grid_cols: 20,
                difficulty: Difficulty::Hard,
                colours: false,
                time_trial: true,
                time_limit: 250,
            }
        );
    }

    #[test]
    fn missing_keys_take_defaults() {
        let settings = Settings::from_toml_str("grid_rows = 9\n");
        assert_eq!(settings.grid_rows, 9);
        assert_eq!(settings.grid_cols, 12);
        assert_eq!(settings.difficulty, Difficulty::Normal);
        assert!(settings.colours);
    }

    #[test]
    fn unknown_difficulty_falls_back_to_normal() {
        let settings = Settings::from_toml_str("difficulty = \"nightmare\"\ngrid_cols = 14\n");
        assert_eq!(settings.difficulty, Difficulty::Normal);
        assert_eq!(settings.grid_cols, 14);
    }

    #[test]
    fn malformed_document_uses_defaults() {
        assert_eq!(Settings::from_toml_str("grid_rows = \"lots\""), Settings::default());
        assert_eq!(Settings::from_toml_str("{{not toml"), Settings::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let settings = Settings::from_toml_str("grid_rows = 1\ngrid_cols = 500\ntime_limit = 0\n");
        assert_eq!(settings.grid_rows, ROWS_RANGE.0);
        assert_eq!(settings.grid_cols, COLS_RANGE.1);
        assert_eq!(settings.time_limit, TIME_LIMIT_RANGE.0);
    }

    #[test]
    fn save_then_load() {
        let dir = env::temp_dir().join(format!("cursedsweeper-test-{}", std::process::id()));
        let path = dir.join("settings.toml");
        let settings = Settings {
            grid_rows: 8,
            difficulty: Difficulty::Brutal,
            time_trial: true,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("difficulty = \"BRUTAL\""));
        assert_eq!(Settings::load(&path), settings);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = env::temp_dir().join("cursedsweeper-does-not-exist").join("settings.toml");
        assert_eq!(Settings::load(&path), Settings::default());
    }
}
