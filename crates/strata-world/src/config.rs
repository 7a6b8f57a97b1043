//! World generation configuration.
//!
//! Every tunable of the generator lives here. Configuration can be loaded
//! from and saved to a TOML file; missing sections fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{WorldError, WorldResult};

/// World extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeConfig {
    /// Width in cells
    pub width: u32,
    /// Height in cells
    pub height: u32,
    /// Pixels per cell
    pub block_size: u32,
}

impl SizeConfig {
    /// Smallest width or height the generator accepts.
    pub const MIN_SIDE: u32 = 16;

    /// Fails when either side is below [`Self::MIN_SIDE`].
    pub fn check(&self) -> WorldResult<()> {
        if self.width < Self::MIN_SIDE || self.height < Self::MIN_SIDE {
            return Err(WorldError::InvalidSize {
                width: self.width,
                height: self.height,
                min: Self::MIN_SIDE,
            });
        }
        Ok(())
    }
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            width: 3000,
            height: 2000,
            block_size: 32,
        }
    }
}

/// Terrain pass parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Height variation as a fraction of the world height
    pub flatness: f64,
    /// Baseline surface row
    pub grass_minimum: i32,
    /// Height noise frequency (per column)
    pub height_frequency: f64,
    /// Height noise octaves
    pub height_octaves: usize,

    /// Stone threshold at the surface
    pub stone_start_frequency: f64,
    /// Stone threshold cap deep underground
    pub stone_end_frequency: f64,
    /// Stone threshold increase per row of depth
    pub stone_frequency_delta: f64,
    /// Cells per stone noise unit (larger = bigger stone patches)
    pub stone_noise_scale: f64,
    /// Rows of stone kept above the surface when the surface is stone
    pub stone_top_deviation: i32,

    /// Cave noise scalar
    pub cave_noise_scalar: f64,
    /// Cave noise threshold in `[0, 1]` (higher = fewer caves)
    pub cave_threshold: f64,
    /// Cave noise octaves
    pub cave_octaves: usize,

    /// Chance of a cloud per column
    pub cloud_chance: f32,
    /// Horizontal gap after a cloud, in pixels
    pub cloud_spacing: u32,
    /// Lowest cloud row above the surface
    pub cloud_min_height: i32,
    /// Random extra cloud height
    pub cloud_height_range: i32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            flatness: 0.1,
            grass_minimum: 1500,
            height_frequency: 0.001,
            height_octaves: 8,
            stone_start_frequency: 0.32,
            stone_end_frequency: 0.77,
            stone_frequency_delta: 0.001,
            stone_noise_scale: 30.0,
            stone_top_deviation: 10,
            cave_noise_scalar: 30.0,
            cave_threshold: 0.68,
            cave_octaves: 3,
            cloud_chance: 0.4,
            cloud_spacing: 400,
            cloud_min_height: 15,
            cloud_height_range: 20,
        }
    }
}

/// Dungeon pass parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// Dungeons per world
    pub count: u32,
    /// Width of the region rooms are scattered over
    pub bounds_width: i32,
    /// Height of the region rooms are scattered over
    pub bounds_height: i32,
    /// Maximum rooms per dungeon
    pub max_rooms: u32,
    /// Minimum room width
    pub room_min_width: i32,
    /// Maximum room width
    pub room_max_width: i32,
    /// Minimum room height
    pub room_min_height: i32,
    /// Maximum room height
    pub room_max_height: i32,
    /// Candidate rectangles tried before a room is skipped
    pub placement_attempts: u32,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            count: 20,
            bounds_width: 100,
            bounds_height: 60,
            max_rooms: 5,
            room_min_width: 15,
            room_max_width: 30,
            room_min_height: 6,
            room_max_height: 10,
            placement_attempts: 100,
        }
    }
}

/// Lighting parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Light seeded at world centre after generation
    pub daylight: f32,
    /// Rows above the centre column's surface where daylight is seeded
    pub daylight_offset: i32,
    /// Rows above the surface that can still be lit
    pub sky_margin: i32,
    /// Hop budget of light emitters
    pub torch_radius: u32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            daylight: 0.9,
            daylight_offset: 5,
            sky_margin: 10,
            torch_radius: 8,
        }
    }
}

/// Full world configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Generation seed (None = chosen by the caller)
    pub seed: Option<u64>,
    /// World extent
    pub size: SizeConfig,
    /// Terrain passes
    pub terrain: TerrainConfig,
    /// Dungeon pass
    pub dungeon: DungeonConfig,
    /// Lighting
    pub lighting: LightingConfig,
}

impl WorldConfig {
    /// Default configuration resized to `width x height`, with the surface
    /// baseline kept at three quarters of the height.
    #[must_use]
    pub fn with_size(width: u32, height: u32) -> Self {
        let mut config = Self::default();
        config.resize(width, height);
        config
    }

    /// Changes the world extent and moves the surface baseline to three
    /// quarters of the new height.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size.width = width;
        self.size.height = height;
        self.terrain.grass_minimum = (height as i32 * 3) / 4;
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("Failed to parse config file: {e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to workable ranges.
    pub fn validate(&mut self) {
        // Size
        self.size.width = self.size.width.clamp(SizeConfig::MIN_SIDE, 20_000);
        self.size.height = self.size.height.clamp(SizeConfig::MIN_SIDE, 20_000);
        self.size.block_size = self.size.block_size.clamp(1, 512);
        let height = self.size.height as i32;

        // Terrain
        let t = &mut self.terrain;
        t.flatness = t.flatness.clamp(0.0, 0.45);
        t.grass_minimum = t.grass_minimum.clamp(1, height - 2);
        t.height_octaves = t.height_octaves.clamp(1, 16);
        t.stone_start_frequency = t.stone_start_frequency.clamp(0.0, 1.0);
        t.stone_end_frequency = t.stone_end_frequency.clamp(t.stone_start_frequency, 1.0);
        t.stone_frequency_delta = t.stone_frequency_delta.max(0.0);
        t.stone_noise_scale = t.stone_noise_scale.max(1.0);
        t.stone_top_deviation = t.stone_top_deviation.clamp(1, height);
        t.cave_threshold = t.cave_threshold.clamp(0.0, 1.0);
        t.cave_octaves = t.cave_octaves.clamp(1, 16);
        t.cloud_chance = t.cloud_chance.clamp(0.0, 1.0);
        t.cloud_min_height = t.cloud_min_height.max(0);
        t.cloud_height_range = t.cloud_height_range.max(1);

        // Dungeons
        let d = &mut self.dungeon;
        d.bounds_width = d.bounds_width.max(1);
        d.bounds_height = d.bounds_height.max(1);
        d.max_rooms = d.max_rooms.max(1);
        d.room_min_width = d.room_min_width.max(3);
        d.room_max_width = d.room_max_width.max(d.room_min_width);
        d.room_min_height = d.room_min_height.max(3);
        d.room_max_height = d.room_max_height.max(d.room_min_height);
        d.placement_attempts = d.placement_attempts.max(1);

        // Lighting
        let l = &mut self.lighting;
        l.daylight = l.daylight.clamp(0.0, 1.0);
        l.sky_margin = l.sky_margin.max(0);
        l.torch_radius = l.torch_radius.clamp(1, 64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = WorldConfig::default();
        assert_eq!(config.size.width, 3000);
        assert_eq!(config.size.height, 2000);
        assert_eq!(config.terrain.grass_minimum, 1500);
        assert_eq!(config.dungeon.count, 20);
        assert_eq!(config.lighting.sky_margin, 10);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = WorldConfig::with_size(64, 48);
        config.terrain.grass_minimum = 500;
        config.dungeon.room_min_width = 10;
        config.dungeon.room_max_width = 4;
        config.lighting.daylight = 3.0;

        config.validate();

        assert_eq!(config.terrain.grass_minimum, 46);
        assert_eq!(config.dungeon.room_max_width, 10);
        assert!((config.lighting.daylight - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("world.toml");

        let mut config = WorldConfig::with_size(128, 96);
        config.seed = Some(42);
        config.dungeon.count = 2;

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = WorldConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = WorldConfig::load_from("/nonexistent/path/world.toml");
        assert_eq!(config, WorldConfig::default());
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("world.toml");
        fs::write(&config_path, "seed = 9\n[size]\nwidth = 200\n").expect("write");

        let config = WorldConfig::load_from(&config_path);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.size.width, 200);
        assert_eq!(config.size.height, 2000);
        assert_eq!(config.dungeon, DungeonConfig::default());
    }

    #[test]
    fn test_unparsable_file_falls_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("world.toml");
        fs::write(&config_path, "size = [").expect("write");
        assert_eq!(WorldConfig::load_from(&config_path), WorldConfig::default());
    }
}
