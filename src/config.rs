use std::error::Error;
use std::path::Path;

use serde::Deserialize;

/// Pipeline tuning, loadable from TOML with per-field defaults so a partial
/// file only overrides what it names.
#[derive(Clone, Debug, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_view_radius")]
    pub view_radius_sections: i32,
    #[serde(default = "default_nearby_radius")]
    pub nearby_radius_blocks: f32,
    #[serde(default = "default_resort_min")]
    pub resort_min: usize,
    #[serde(default = "default_true")]
    pub smart_cull: bool,
    #[serde(default = "default_aspect")]
    pub aspect: f32,
    #[serde(default)]
    pub clouds: bool,
    #[serde(default)]
    pub weather: bool,
    #[serde(default = "default_events_budget")]
    pub max_events_per_tick: usize,
    #[serde(default = "default_inflight_factor")]
    pub inflight_per_worker: usize,
    #[serde(default)]
    pub terrain: TerrainConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainConfig {
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default = "default_ground")]
    pub ground_level: i32,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_frequency")]
    pub height_frequency: f32,
    #[serde(default = "default_water")]
    pub water_level: i32,
}

fn default_view_radius() -> i32 {
    6
}
fn default_nearby_radius() -> f32 {
    32.0
}
fn default_resort_min() -> usize {
    15
}
fn default_true() -> bool {
    true
}
fn default_aspect() -> f32 {
    16.0 / 9.0
}
fn default_events_budget() -> usize {
    20_000
}
fn default_inflight_factor() -> usize {
    2
}
fn default_seed() -> i32 {
    1337
}
fn default_ground() -> i32 {
    24
}
fn default_amplitude() -> f32 {
    20.0
}
fn default_frequency() -> f32 {
    0.008
}
fn default_water() -> i32 {
    18
}

impl Default for RenderConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty config parses via defaults")
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty terrain config parses via defaults")
    }
}

pub fn load_config_from_path(path: &Path) -> Result<RenderConfig, Box<dyn Error>> {
    let s = std::fs::read_to_string(path)?;
    let cfg: RenderConfig = toml::from_str(&s)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: RenderConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.view_radius_sections, 6);
        assert_eq!(cfg.resort_min, 15);
        assert!(cfg.smart_cull);
        assert_eq!(cfg.terrain.ground_level, 24);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg: RenderConfig = toml::from_str(
            "view_radius_sections = 3\n[terrain]\nseed = 42\n",
        )
        .unwrap();
        assert_eq!(cfg.view_radius_sections, 3);
        assert_eq!(cfg.terrain.seed, 42);
        assert_eq!(cfg.terrain.water_level, 18);
        assert!((cfg.nearby_radius_blocks - 32.0).abs() < f32::EPSILON);
    }
}
