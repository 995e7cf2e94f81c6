use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub markers: MarkerConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub observations_csv: PathBuf,
    pub location_column: String,
    pub occurrences_column: String,
    pub overlay_geojson: Option<PathBuf>,
    /// Feature property holding each overlay region's name.
    #[serde(default = "default_overlay_id_property")]
    pub overlay_id_property: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarkerConfig {
    /// Radius used when the dataset is empty and no min/max range exists.
    #[serde(default = "default_radius")]
    pub default_radius: i64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        MarkerConfig {
            default_radius: default_radius(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_overlay_id_property() -> String {
    "name".to_string()
}

fn default_radius() -> i64 {
    5
}

fn default_static_dir() -> PathBuf {
    PathBuf::from(".")
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: AppConfig = toml::from_str(
            r#"
            [input]
            observations_csv = "observations.csv"
            location_column = "coordinates"
            occurrences_column = "occurrences"
            overlay_geojson = "world.geojson"
            overlay_id_property = "NAME"

            [markers]
            default_radius = 4

            [server]
            port = 8080
            static_dir = "web"
            "#,
        )
        .unwrap();

        assert_eq!(config.input.location_column, "coordinates");
        assert_eq!(config.input.overlay_id_property, "NAME");
        assert_eq!(config.markers.default_radius, 4);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn markers_section_is_optional() {
        let config: AppConfig = toml::from_str(
            r#"
            [input]
            observations_csv = "observations.csv"
            location_column = "coordinates"
            occurrences_column = "occurrences"

            [server]
            port = 3000
            "#,
        )
        .unwrap();

        assert_eq!(config.markers.default_radius, 5);
        assert!(config.input.overlay_geojson.is_none());
        assert_eq!(config.server.static_dir, PathBuf::from("."));
    }
}
