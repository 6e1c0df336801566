use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::compositor::transition::TransitionKind;
use crate::constants::{
    DEFAULT_INTERVAL_SECS, MAX_INTERVAL_SECS, MAX_TRANSITION_MS, MIN_INTERVAL_SECS,
    MIN_TRANSITION_MS,
};
use crate::error::{SlideshowError, SlideshowResult};

const FILENAME: &str = "profiles.json";
const APP_DIR: &str = "cinematic-slideshow";
pub const DEFAULT_PROFILE: &str = "Default";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Fill the viewport, cropping overflow.
    #[default]
    Cover,
    /// Fit inside the viewport, letterboxing the rest.
    Contain,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectOrder {
    #[default]
    Random,
    Sequential,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAnchor {
    Top,
    Middle,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAnchor {
    Left,
    #[default]
    Center,
    Right,
}

/// A folder to scan, written either as `"path"` or `["path", recursive]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FolderEntry {
    WithRecursion(PathBuf, bool),
    Path(PathBuf),
}

impl FolderEntry {
    pub fn path(&self) -> &Path {
        match self {
            Self::WithRecursion(path, _) | Self::Path(path) => path,
        }
    }

    pub fn recursive(&self) -> bool {
        match self {
            Self::WithRecursion(_, recursive) => *recursive,
            Self::Path(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectToggles {
    pub crossfade: bool,
    pub slide: bool,
    pub zoom: bool,
    pub wipe: bool,
    pub fade_to_black: bool,
}

impl Default for EffectToggles {
    fn default() -> Self {
        Self {
            crossfade: true,
            slide: false,
            zoom: false,
            wipe: false,
            fade_to_black: false,
        }
    }
}

impl EffectToggles {
    /// Enabled kinds in their canonical order.
    pub fn enabled(&self) -> Vec<TransitionKind> {
        [
            (self.crossfade, TransitionKind::Crossfade),
            (self.slide, TransitionKind::Slide),
            (self.zoom, TransitionKind::Zoom),
            (self.wipe, TransitionKind::Wipe),
            (self.fade_to_black, TransitionKind::FadeToBlack),
        ]
        .into_iter()
        .filter_map(|(on, kind)| on.then_some(kind))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub folders: Vec<FolderEntry>,
    pub interval_sec: f64,
    pub fade_duration_ms: u64,
    pub random_order: bool,
    pub ken_burns: bool,
    pub ken_intensity: u8,
    pub fit_mode: FitMode,
    pub show_filename: bool,
    pub filename_v_pos: VerticalAnchor,
    pub filename_h_pos: HorizontalAnchor,
    pub filename_v_offset: i32,
    pub filename_h_offset: i32,
    pub font_family: String,
    pub font_size: u32,
    pub font_bold: bool,
    pub effects: EffectToggles,
    pub effect_order: EffectOrder,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            interval_sec: DEFAULT_INTERVAL_SECS,
            fade_duration_ms: 1000,
            random_order: true,
            ken_burns: true,
            ken_intensity: 5,
            fit_mode: FitMode::Cover,
            show_filename: false,
            filename_v_pos: VerticalAnchor::Bottom,
            filename_h_pos: HorizontalAnchor::Center,
            filename_v_offset: 0,
            filename_h_offset: 0,
            font_family: "sans-serif".to_string(),
            font_size: 18,
            font_bold: true,
            effects: EffectToggles::default(),
            effect_order: EffectOrder::Random,
        }
    }
}

impl Profile {
    pub fn validate(&self) -> SlideshowResult<()> {
        if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&self.interval_sec) {
            return Err(SlideshowError::config(format!(
                "interval_sec must be within 1..=3600, got {}",
                self.interval_sec
            )));
        }
        if !(MIN_TRANSITION_MS..=MAX_TRANSITION_MS).contains(&self.fade_duration_ms) {
            return Err(SlideshowError::config(format!(
                "fade_duration_ms must be within 100..=10000, got {}",
                self.fade_duration_ms
            )));
        }
        if !(1..=10).contains(&self.ken_intensity) {
            return Err(SlideshowError::config(format!(
                "ken_intensity must be within 1..=10, got {}",
                self.ken_intensity
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileStore {
    #[serde(default = "default_profile_name")]
    pub last_used_profile: String,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
    /// Set when the file on disk had entries that could not be read; it is left untouched.
    #[serde(skip)]
    read_only: bool,
}

fn default_profile_name() -> String {
    DEFAULT_PROFILE.to_string()
}

impl Default for ProfileStore {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(DEFAULT_PROFILE.to_string(), Profile::default());
        Self {
            last_used_profile: default_profile_name(),
            profiles,
            read_only: false,
        }
    }
}

impl ProfileStore {
    pub fn path() -> SlideshowResult<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| SlideshowError::config("could not determine config directory"))
    }

    pub fn load_from(path: &Path) -> SlideshowResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut store: ProfileStore = serde_json::from_str(&contents)?;
        store
            .profiles
            .entry(DEFAULT_PROFILE.to_string())
            .or_default();
        Ok(store)
    }

    /// Loads the store, keeping every profile that parses.
    ///
    /// A missing file is created with the `Default` profile. A file with unreadable parts is
    /// never rewritten: the readable profiles are returned and the store becomes read-only.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "creating default profile store");
            let store = Self::default();
            if let Err(e) = store.save_to(path) {
                warn!(path = %path.display(), error = %e, "failed to write default profile store");
            }
            return store;
        }
        let value = std::fs::read_to_string(path)
            .map_err(SlideshowError::from)
            .and_then(|contents| {
                serde_json::from_str::<serde_json::Value>(&contents).map_err(SlideshowError::from)
            });
        match value {
            Ok(value) => Self::from_value(path, value),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "unreadable profile store, using defaults"
                );
                Self {
                    read_only: true,
                    ..Self::default()
                }
            }
        }
    }

    fn from_value(path: &Path, value: serde_json::Value) -> Self {
        let mut store = Self {
            profiles: BTreeMap::new(),
            ..Self::default()
        };
        let Some(root) = value.as_object() else {
            warn!(path = %path.display(), "profile store is not an object, using defaults");
            return Self {
                read_only: true,
                ..Self::default()
            };
        };
        if let Some(name) = root.get("last_used_profile").and_then(|v| v.as_str()) {
            store.last_used_profile = name.to_string();
        }
        match root.get("profiles").and_then(|v| v.as_object()) {
            Some(profiles) => {
                for (name, raw) in profiles {
                    match Profile::deserialize(raw) {
                        Ok(profile) => {
                            store.profiles.insert(name.clone(), profile);
                        }
                        Err(e) => {
                            warn!(profile = %name, error = %e, "skipping unreadable profile");
                            store.read_only = true;
                        }
                    }
                }
            }
            None if root.contains_key("profiles") => store.read_only = true,
            None => {}
        }
        store
            .profiles
            .entry(DEFAULT_PROFILE.to_string())
            .or_default();
        if store.read_only {
            warn!(path = %path.display(), "profile store has errors, it will not be overwritten");
        }
        store
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn save_to(&self, path: &Path) -> SlideshowResult<()> {
        if self.read_only {
            return Err(SlideshowError::config(format!(
                "{} has unreadable entries, fix it by hand before saving",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> SlideshowResult<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| SlideshowError::ProfileNotFound(name.to_string()))
    }

    /// Picks the requested profile, then the last used one, then `Default`.
    pub fn resolve(&self, requested: Option<&str>) -> (String, Profile) {
        if let Some(name) = requested {
            match self.get(name) {
                Ok(profile) => return (name.to_string(), profile.clone()),
                Err(e) => warn!(error = %e, "falling back"),
            }
        }
        if let Ok(profile) = self.get(&self.last_used_profile) {
            return (self.last_used_profile.clone(), profile.clone());
        }
        let profile = self
            .profiles
            .get(DEFAULT_PROFILE)
            .cloned()
            .unwrap_or_default();
        (DEFAULT_PROFILE.to_string(), profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let profile: Profile = serde_json::from_str(r#"{"interval_sec": 8}"#).unwrap();
        assert_eq!(profile.interval_sec, 8.0);
        assert_eq!(profile.fade_duration_ms, 1000);
        assert_eq!(profile.fit_mode, FitMode::Cover);
        assert_eq!(profile.effects.enabled(), vec![TransitionKind::Crossfade]);
    }

    #[test]
    fn folders_accept_both_shapes() {
        let profile: Profile =
            serde_json::from_str(r#"{"folders": ["/a", ["/b", true], ["/c", false]]}"#).unwrap();
        assert_eq!(profile.folders.len(), 3);
        assert_eq!(profile.folders[0].path(), Path::new("/a"));
        assert!(!profile.folders[0].recursive());
        assert!(profile.folders[1].recursive());
        assert!(!profile.folders[2].recursive());
    }

    #[test]
    fn enum_fields_use_snake_case() {
        let profile: Profile = serde_json::from_str(
            r#"{"fit_mode": "contain", "effect_order": "sequential",
                "filename_v_pos": "top", "filename_h_pos": "right",
                "effects": {"crossfade": false, "wipe": true, "fade_to_black": true}}"#,
        )
        .unwrap();
        assert_eq!(profile.fit_mode, FitMode::Contain);
        assert_eq!(profile.effect_order, EffectOrder::Sequential);
        assert_eq!(profile.filename_v_pos, VerticalAnchor::Top);
        assert_eq!(profile.filename_h_pos, HorizontalAnchor::Right);
        assert_eq!(
            profile.effects.enabled(),
            vec![TransitionKind::Wipe, TransitionKind::FadeToBlack]
        );
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(Profile::default().validate().is_ok());
        let bad_interval = Profile {
            interval_sec: 0.5,
            ..Profile::default()
        };
        assert!(bad_interval.validate().is_err());
        let bad_fade = Profile {
            fade_duration_ms: 20_000,
            ..Profile::default()
        };
        assert!(bad_fade.validate().is_err());
        let bad_intensity = Profile {
            ken_intensity: 11,
            ..Profile::default()
        };
        assert!(bad_intensity.validate().is_err());
    }

    #[test]
    fn store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILENAME);
        let mut store = ProfileStore::default();
        store.profiles.insert(
            "Night".to_string(),
            Profile {
                interval_sec: 12.0,
                ..Profile::default()
            },
        );
        store.last_used_profile = "Night".to_string();
        store.save_to(&path).unwrap();

        let loaded = ProfileStore::load_from(&path).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn load_or_default_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new").join(FILENAME);
        let store = ProfileStore::load_or_default(&path);
        assert!(store.profiles.contains_key(DEFAULT_PROFILE));
        assert!(!store.is_read_only());
        assert!(ProfileStore::load_from(&path).is_ok());
    }

    #[test]
    fn load_or_default_leaves_broken_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        std::fs::write(&path, "{ not json").unwrap();
        let store = ProfileStore::load_or_default(&path);
        assert!(store.profiles.contains_key(DEFAULT_PROFILE));
        assert!(store.is_read_only());
        assert!(store.save_to(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn one_bad_profile_keeps_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        let original = r#"{"last_used_profile": "Work", "profiles": {
            "Work": {"interval_sec": 9},
            "Travel": {"fit_mode": "fill"},
            "Loud": {"ken_intensity": 300}}}"#;
        std::fs::write(&path, original).unwrap();

        let store = ProfileStore::load_or_default(&path);
        assert_eq!(store.last_used_profile, "Work");
        assert_eq!(store.get("Work").unwrap().interval_sec, 9.0);
        assert!(store.get("Travel").is_err());
        assert!(store.get("Loud").is_err());
        assert!(store.profiles.contains_key(DEFAULT_PROFILE));
        assert!(store.is_read_only());

        assert!(store.save_to(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn load_adds_missing_default_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        std::fs::write(&path, r#"{"last_used_profile": "Work", "profiles": {"Work": {}}}"#)
            .unwrap();
        let store = ProfileStore::load_from(&path).unwrap();
        assert!(store.profiles.contains_key("Work"));
        assert!(store.profiles.contains_key(DEFAULT_PROFILE));
    }

    #[test]
    fn resolve_falls_back_in_order() {
        let mut store = ProfileStore::default();
        store.profiles.insert("Work".to_string(), Profile::default());
        store.last_used_profile = "Work".to_string();

        assert_eq!(store.resolve(Some("Default")).0, "Default");
        assert_eq!(store.resolve(Some("Missing")).0, "Work");
        assert_eq!(store.resolve(None).0, "Work");

        store.last_used_profile = "Gone".to_string();
        assert_eq!(store.resolve(None).0, DEFAULT_PROFILE);
        assert!(matches!(
            store.get("Gone"),
            Err(SlideshowError::ProfileNotFound(_))
        ));
    }
}
