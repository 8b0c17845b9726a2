//! JSON configuration for the watcher and the filing pipeline.
//!
//! The config lives at `~/.sloan_suite/config.json`. Loading fills in any
//! keys that newer versions added to the defaults without touching values the
//! user set explicitly, and only rewrites the file when that merge changed
//! something.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;

pub const APP_DIR_NAME: &str = ".sloan_suite";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const CONFIG_SCHEMA_VERSION: u32 = 2;
pub const DATE_FMT_DEFAULT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("home directory not found")]
    NoHomeDir,

    #[error("invalid config path: {0}")]
    InvalidPath(PathBuf),

    #[error("malformed config {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    FileError(std::io::Error),
}

/// A display name paired with the short form used in rendered filenames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acronym {
    pub name: String,
    pub acronym: String,
}

impl Acronym {
    fn new(name: &str, acronym: &str) -> Self {
        Self {
            name: name.to_owned(),
            acronym: acronym.to_owned(),
        }
    }
}

/// Settings read by the watcher core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    /// How long a file's size must stay unchanged before it counts as settled.
    pub quiet_seconds: f64,
    pub process_existing_on_start: bool,
    pub sweep_enabled: bool,
    pub sweep_age_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            quiet_seconds: 1.5,
            process_existing_on_start: false,
            sweep_enabled: false,
            sweep_age_seconds: 120,
            sweep_interval_seconds: 60,
        }
    }
}

impl WatchSettings {
    /// Returns the quiet window, or `None` if `quiet_seconds` is negative or not finite.
    pub fn quiet(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.quiet_seconds).ok()
    }

    pub fn sweep_age(&self) -> Duration {
        Duration::from_secs(self.sweep_age_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

/// Where files land in the remote document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerSettings {
    pub root_library_name: String,
    pub downloads_folder_path: String,
    pub customer_root_path: String,
    pub create_default_tree: Vec<String>,
    /// Keyword acronym to customer-relative folder.
    pub routing: BTreeMap<String, String>,
}

impl Default for OrganizerSettings {
    fn default() -> Self {
        let routing = [
            ("InitialP", "/Initial/Pictures"),
            ("InitialQ", "/Initial/Quotes"),
            ("FinalP", "/Final/Pictures"),
            ("FinalQ", "/Final/Quotes"),
            ("CF", "/Extra/Completion Forms"),
            ("MS", "/Extra/Measure Sheets"),
            ("BP", "/Extra"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        Self {
            root_library_name: "Documents".into(),
            downloads_folder_path: "/Downloads".into(),
            customer_root_path: "/Customers".into(),
            create_default_tree: [
                "/Initial/Pictures",
                "/Initial/Quotes",
                "/Final/Pictures",
                "/Final/Quotes",
                "/Extra/Completion Forms",
                "/Extra/Measure Sheets",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            routing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watch_folder: PathBuf,
    pub date_format: String,
    pub schema_version: u32,
    pub filename_template: String,
    pub keywords: Vec<Acronym>,
    pub brands: Vec<Acronym>,
    pub locations: BTreeMap<String, Vec<Acronym>>,
    pub organizer: OrganizerSettings,
    pub watch: WatchSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        let watch_folder = dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("Downloads"));

        let mut locations = BTreeMap::new();
        locations.insert(
            "Interior".to_owned(),
            vec![
                Acronym::new("Living Room", "Living"),
                Acronym::new("Dining Room", "Dining"),
                Acronym::new("Family Room", "Family"),
                Acronym::new("Bedroom", "Bed"),
                Acronym::new("Master Bed", "MBed"),
                Acronym::new("Master Bath", "MBath"),
            ],
        );
        locations.insert(
            "Exterior".to_owned(),
            vec![
                Acronym::new("Right Elevation", "Right"),
                Acronym::new("Left Elevation", "Left"),
                Acronym::new("Rear Elevation", "Rear"),
                Acronym::new("Front Elevation", "Front"),
            ],
        );

        Self {
            watch_folder,
            date_format: DATE_FMT_DEFAULT.to_owned(),
            schema_version: CONFIG_SCHEMA_VERSION,
            filename_template: "{customer} {keyword} {detail} {extra} {date}".to_owned(),
            keywords: vec![
                Acronym::new("Initial Quote", "InitialQ"),
                Acronym::new("Final Quote", "FinalQ"),
                Acronym::new("Initial Picture", "InitialP"),
                Acronym::new("Final Picture", "FinalP"),
                Acronym::new("Blueprint", "BP"),
                Acronym::new("Completion Form", "CF"),
                Acronym::new("Measure Sheet", "MS"),
            ],
            brands: vec![
                Acronym::new("Anlin", "A"),
                Acronym::new("ProVia", "PV"),
                Acronym::new("Pella", "P"),
                Acronym::new("Andersen", "AD"),
                Acronym::new("Hunter Douglas", "HD"),
            ],
            locations,
            organizer: OrganizerSettings::default(),
            watch: WatchSettings::default(),
        }
    }
}

/// Resolves the application directory `~/.sloan_suite`.
pub fn app_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_DIR_NAME))
}

/// Reads and writes one config file on disk.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store at `~/.sloan_suite/config.json`.
    pub fn default_location() -> Result<Self, ConfigError> {
        Ok(Self::new(app_dir()?.join(CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config, creating it with defaults when missing.
    ///
    /// Missing keys are filled from the defaults and `schema_version` is
    /// bumped; the file is rewritten only if that changed its contents.
    /// Keys this crate does not know about are preserved on disk.
    ///
    /// # Errors
    /// Returns [`ConfigError::Malformed`] if the file is not valid JSON or
    /// does not match the expected shape, or [`ConfigError::FileError`] on I/O failure.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.path.exists() {
            let cfg = AppConfig::default();
            self.save(&cfg)?;
            return Ok(cfg);
        }

        let raw = fs::read_to_string(&self.path).map_err(ConfigError::FileError)?;
        let mut value: Value = serde_json::from_str(&raw).map_err(|source| self.malformed(source))?;
        let before = value.clone();

        let defaults = serde_json::to_value(AppConfig::default()).map_err(ConfigError::Serialize)?;
        merge_missing(&mut value, &defaults);
        if let Value::Object(map) = &mut value {
            map.insert("schema_version".into(), Value::from(CONFIG_SCHEMA_VERSION));
        }

        if value != before {
            self.write_value(&value)?;
        }

        serde_json::from_value(value).map_err(|source| self.malformed(source))
    }

    /// Persists `cfg` as given, keeping any top-level sections of the
    /// existing file that [`AppConfig`] does not model. Entries removed from
    /// modeled maps stay removed.
    pub fn save(&self, cfg: &AppConfig) -> Result<(), ConfigError> {
        let mut value = serde_json::to_value(cfg).map_err(ConfigError::Serialize)?;

        let existing = fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());
        if let (Value::Object(dst), Some(Value::Object(src))) = (&mut value, existing) {
            for (key, section) in src {
                dst.entry(key).or_insert(section);
            }
        }

        self.write_value(&value)
    }

    /// Overwrites the file with the defaults.
    pub fn reset(&self) -> Result<AppConfig, ConfigError> {
        let cfg = AppConfig::default();
        let value = serde_json::to_value(&cfg).map_err(ConfigError::Serialize)?;
        self.write_value(&value)?;
        Ok(cfg)
    }

    fn write_value(&self, value: &Value) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value).map_err(ConfigError::Serialize)?;
        write_atomic(&self.path, &data)
    }

    fn malformed(&self, source: serde_json::Error) -> ConfigError {
        ConfigError::Malformed {
            path: self.path.clone(),
            source,
        }
    }
}

/// Fills keys missing from `dst` with the values in `src`, recursing into
/// nested objects. Values already present in `dst` are never overwritten.
fn merge_missing(dst: &mut Value, src: &Value) {
    if let (Value::Object(dst), Value::Object(src)) = (dst, src) {
        for (key, src_val) in src {
            match dst.get_mut(key) {
                Some(dst_val) => merge_missing(dst_val, src_val),
                None => {
                    dst.insert(key.clone(), src_val.clone());
                }
            }
        }
    }
}

/// Writes to a temp file in the target directory and renames it in place.
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let dir = path
        .parent()
        .ok_or_else(|| ConfigError::InvalidPath(path.to_path_buf()))?;
    fs::create_dir_all(dir).map_err(ConfigError::FileError)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(ConfigError::FileError)?;
    tmp.write_all(data).map_err(ConfigError::FileError)?;
    tmp.persist(path)
        .map_err(|e| ConfigError::FileError(e.error))?;
    Ok(())
}
