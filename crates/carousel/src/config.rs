use crate::events::CarouselEvent;
use crate::geometry::Size;
use async_channel::Sender;
use derive_more::{Deref, From, Into};
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use palette::Srgba;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TIMER_INTERVAL: f64 = 1.0 / 60.0;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Width over height of every slot. `None` takes the container's ratio.
    pub aspect_ratio: Option<f64>,
    pub top_bottom_offset: f64,
    pub parallax: f64,
    pub min_slots_per_circle: usize,
    pub max_slots_per_circle: usize,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: None,
            top_bottom_offset: 10.0,
            parallax: 0.08,
            min_slots_per_circle: 2,
            max_slots_per_circle: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deref, From, Into, SerializeDisplay, DeserializeFromStr)]
pub struct ShadowColor(Srgba<f64>);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid color '{0}', expected #RRGGBB or #RRGGBBAA")]
pub struct ParseColorError(String);

impl FromStr for ShadowColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let err = || ParseColorError(s.to_string());

        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|v| v as f64 / 255.0)
                .map_err(|_| err())
        };

        let alpha = if hex.len() == 8 { channel(6)? } else { 1.0 };
        Ok(Self(Srgba::new(channel(0)?, channel(2)?, channel(4)?, alpha)))
    }
}

impl fmt::Display for ShadowColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = self.0.into_components();
        write!(f, "#{:02x}{:02x}{:02x}", to_u8(r), to_u8(g), to_u8(b))?;
        if to_u8(a) != u8::MAX {
            write!(f, "{:02x}", to_u8(a))?;
        }
        Ok(())
    }
}

impl Default for ShadowColor {
    fn default() -> Self {
        Self(Srgba::new(0.0, 0.0, 0.0, 1.0))
    }
}

/// Passed through to the host untouched when a child is added.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub radius: f64,
    pub color: ShadowColor,
    pub opacity: f64,
    pub offset: Size,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            radius: 3.0,
            color: ShadowColor::default(),
            opacity: 0.25,
            offset: Size::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Points per second above which a release completes to the neighbour.
    pub swipe_velocity_threshold: f64,
    pub reference_round_width: f64,
    /// Container widths per second.
    pub min_velocity: f64,
    /// Container widths per second.
    pub centering_velocity: f64,
    /// Seconds between animation ticks.
    pub rotation_timer_interval: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_velocity_threshold: 600.0,
            reference_round_width: 300.0,
            min_velocity: 5.0,
            centering_velocity: 5.0,
            rotation_timer_interval: DEFAULT_TIMER_INTERVAL,
        }
    }
}

impl GestureConfig {
    pub fn timer_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.rotation_timer_interval)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_TIMER_INTERVAL))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Configuration {
    pub geometry: GeometryConfig,
    pub shadow: ShadowConfig,
    pub gestures: GestureConfig,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Slots per circle must satisfy 1 <= min <= max, got min {min} and max {max}")]
    InvalidSlotRange { min: usize, max: usize },
    #[error("Parallax must lie within [0, 1], got {0}")]
    InvalidParallax(f64),
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
}

impl Configuration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let geometry = &self.geometry;
        if geometry.min_slots_per_circle < 1
            || geometry.min_slots_per_circle > geometry.max_slots_per_circle
        {
            return Err(ConfigError::InvalidSlotRange {
                min: geometry.min_slots_per_circle,
                max: geometry.max_slots_per_circle,
            });
        }

        if !(0.0..=1.0).contains(&geometry.parallax) {
            return Err(ConfigError::InvalidParallax(geometry.parallax));
        }

        let gestures = &self.gestures;
        let positive = [
            ("geometry.aspect_ratio", geometry.aspect_ratio.unwrap_or(1.0)),
            ("gestures.reference_round_width", gestures.reference_round_width),
            ("gestures.rotation_timer_interval", gestures.rotation_timer_interval),
            ("gestures.min_velocity", gestures.min_velocity),
            ("gestures.centering_velocity", gestures.centering_velocity),
        ];
        if let Some((field, value)) = positive
            .into_iter()
            .find(|(_, v)| !(v.is_finite() && *v > 0.0))
        {
            return Err(ConfigError::NotPositive { field, value });
        }

        Ok(())
    }
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "carousel", "carousel").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<Configuration, ConfigError> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Configuration, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("CAROUSEL").separator("__"))
        .build()?;

    let configuration: Configuration = s.try_deserialize()?;
    configuration.validate()?;
    Ok(configuration)
}

pub fn load_or_default() -> Configuration {
    match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Falling back to default configuration: {}", e);
            Configuration::default()
        }
    }
}

pub fn write_default_config() -> std::io::Result<PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

pub const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Sends [`CarouselEvent::ConfigReload`] whenever `config_path` is created, modified or removed.
/// Returns once the receiving side is gone.
pub async fn run_async_watcher(
    config_path: PathBuf,
    tx: Sender<CarouselEvent>,
) -> Result<(), ConfigError> {
    let config_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or(ConfigError::ConfigDirNotFound)?;
    fs_err::create_dir_all(&config_dir)?;

    let (bridge_tx, bridge_rx) = async_channel::unbounded();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    )?;
    watcher.watch(&config_dir, RecursiveMode::NonRecursive)?;
    log::debug!("Watching {:?}", config_path);

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let touches_config = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) && event.paths.iter().any(|p| p == &config_path);

                if touches_config && tx.send(CarouselEvent::ConfigReload).await.is_err() {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Configuration {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config_file_matches_defaults() {
        assert_eq!(from_toml(DEFAULT_CONFIG), Configuration::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = from_toml(
            r##"
            [geometry]
            aspect_ratio = 1.5
            max_slots_per_circle = 6

            [shadow]
            color = "#336699"
            "##,
        );
        assert_eq!(cfg.geometry.aspect_ratio, Some(1.5));
        assert_eq!(cfg.geometry.max_slots_per_circle, 6);
        assert_eq!(cfg.geometry.min_slots_per_circle, 2);
        assert_eq!(cfg.gestures, GestureConfig::default());
        assert_eq!(cfg.shadow.color.to_string(), "#336699");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_shadow_color_parsing() {
        let cases = vec![
            ("\"#000000\"", (0.0, 0.0, 0.0, 1.0)),
            ("\"ffffff\"", (1.0, 1.0, 1.0, 1.0)),
            ("\"#ff000080\"", (1.0, 0.0, 0.0, 128.0 / 255.0)),
        ];

        for (json, (r, g, b, a)) in cases {
            let color: ShadowColor = serde_json::from_str(json).unwrap();
            assert_eq!(color.into_components(), (r, g, b, a));
        }

        assert!("#12345".parse::<ShadowColor>().is_err());
        assert!("#gg0000".parse::<ShadowColor>().is_err());
    }

    #[test]
    fn test_shadow_color_display_round_trip() {
        for s in ["#000000", "#336699", "#ff000080"] {
            assert_eq!(s.parse::<ShadowColor>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut cfg = Configuration::default();
        cfg.geometry.min_slots_per_circle = 5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidSlotRange { min: 5, max: 4 })
        ));

        let mut cfg = Configuration::default();
        cfg.geometry.min_slots_per_circle = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidSlotRange { .. })));

        let mut cfg = Configuration::default();
        cfg.geometry.parallax = 1.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidParallax(_))));

        let mut cfg = Configuration::default();
        cfg.geometry.aspect_ratio = Some(0.0);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NotPositive {
                field: "geometry.aspect_ratio",
                ..
            })
        ));

        let mut cfg = Configuration::default();
        cfg.gestures.rotation_timer_interval = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NotPositive { .. })));
    }

    #[test]
    fn test_timer_interval_falls_back() {
        let mut gestures = GestureConfig::default();
        assert_eq!(
            gestures.timer_interval(),
            Duration::from_secs_f64(1.0 / 60.0)
        );
        gestures.rotation_timer_interval = -1.0;
        assert_eq!(
            gestures.timer_interval(),
            Duration::from_secs_f64(1.0 / 60.0)
        );
    }
}
