use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::geometry::PixelPoint;
use crate::page::DEFAULT_CACHE_SIZE;
use crate::regions::{RegionAction, RegionError, RegionOfInterest, RegionSet};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pageloupe";

/// One region of interest plus the field it focuses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub value: String,
    pub top_left: PixelPoint,
    pub bottom_right: PixelPoint,
}

impl RegionConfig {
    fn new(id: &str, label: &str, value: &str, top_left: (u32, u32), bottom_right: (u32, u32)) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            value: value.to_string(),
            top_left: PixelPoint::new(top_left.0, top_left.1),
            bottom_right: PixelPoint::new(bottom_right.0, bottom_right.1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// URL or path opened when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default = "default_true")]
    pub magnifier_enabled: bool,

    #[serde(default = "default_page_cache_size")]
    pub page_cache_size: usize,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_regions")]
    pub regions: Vec<RegionConfig>,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_page_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

fn default_fetch_timeout_secs() -> u64 {
    crate::fetch::DEFAULT_FETCH_TIMEOUT.as_secs()
}

fn default_regions() -> Vec<RegionConfig> {
    vec![
        RegionConfig::new("name", "Name", "", (20, 20), (140, 60)),
        RegionConfig::new("date", "Date", "", (160, 20), (280, 60)),
        RegionConfig::new("amount", "Amount", "", (20, 100), (280, 160)),
        RegionConfig::new("signature", "Signature", "", (20, 200), (280, 270)),
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            source: None,
            magnifier_enabled: true,
            page_cache_size: default_page_cache_size(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            regions: default_regions(),
        }
    }
}

impl Settings {
    /// Validated region set; each region focuses the field named after its id
    pub fn region_set(&self) -> Result<RegionSet, RegionError> {
        RegionSet::new(
            self.regions
                .iter()
                .map(|r| {
                    RegionOfInterest::new(
                        r.id.clone(),
                        r.top_left,
                        r.bottom_right,
                        RegionAction::FocusField(r.id.clone()),
                    )
                })
                .collect(),
        )
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from `path`, or the default location. A missing file is
/// created with defaults; a broken one is reported and defaults stay in effect.
pub fn load_settings(path: Option<&Path>) {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let Some(path) = preferred_config_path() else {
                warn!("Could not determine config directory, using default settings");
                return;
            };
            path
        }
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Err(e) = settings.region_set() {
                    warn!("Invalid regions in {path:?}: {e}; using default regions");
                    settings.regions = default_regions();
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

pub fn parse_settings(content: &str) -> Result<Settings, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = match serde_yaml::to_string(settings) {
        Ok(body) => format!("{SETTINGS_HEADER}{body}"),
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# pageloupe configuration
#
# source:             URL or file opened when none is given on the command line
# magnifier_enabled:  start with the loupe switched on
# page_cache_size:    prepared pages kept in memory
# fetch_timeout_secs: give up on a download after this many seconds
# regions:            clickable rectangles in page pixels; bottom_right is
#                     exclusive and rectangles must not overlap
"#;

// Public API for accessing settings

pub fn get_settings() -> Settings {
    SETTINGS
        .read()
        .map(|s| s.clone())
        .unwrap_or_default()
}
