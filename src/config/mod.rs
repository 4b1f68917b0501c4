use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::render::WatermarkOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "garim";
const APP_CONFIG_FILE: &str = "config.json";

/// Watermark defaults from `config.json`. Every field is optional;
/// anything absent keeps the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AppConfig {
    #[serde(default)]
    pub(crate) watermark_text: Option<String>,
    #[serde(default)]
    pub(crate) watermark_font_size: Option<f32>,
    #[serde(default)]
    pub(crate) watermark_opacity: Option<f32>,
    #[serde(default)]
    pub(crate) watermark_density: Option<f32>,
}

impl AppConfig {
    pub(crate) fn apply_to(&self, watermark: &mut WatermarkOptions) {
        if let Some(text) = &self.watermark_text {
            watermark.text = text.clone();
        }
        if let Some(font_size) = self.watermark_font_size {
            watermark.font_size = font_size;
        }
        if let Some(opacity) = self.watermark_opacity {
            watermark.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(density) = self.watermark_density {
            watermark.density = density;
        }
    }
}

pub(crate) fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "garim",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/garim/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("garim", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/garim/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("garim", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = load_app_config_with(Some(Path::new("/nonexistent/none")), None);
        assert!(config.watermark_text.is_none());
        assert!(config.watermark_opacity.is_none());
    }

    #[test]
    fn apply_to_overrides_only_present_fields_and_clamps_opacity() {
        let config = AppConfig {
            watermark_text: Some("internal".to_string()),
            watermark_font_size: None,
            watermark_opacity: Some(2.0),
            watermark_density: None,
        };
        let mut watermark = WatermarkOptions::default();
        let original_font_size = watermark.font_size;
        let original_density = watermark.density;

        config.apply_to(&mut watermark);
        assert_eq!(watermark.text, "internal");
        assert_eq!(watermark.opacity, 1.0);
        assert_eq!(watermark.font_size, original_font_size);
        assert_eq!(watermark.density, original_density);
    }

    #[test]
    fn config_json_parses_watermark_fields() {
        let config: AppConfig = serde_json::from_str(
            r#"{"watermark_text": "draft", "watermark_density": 2.5}"#,
        )
        .expect("valid config should parse");
        assert_eq!(config.watermark_text.as_deref(), Some("draft"));
        assert_eq!(config.watermark_density, Some(2.5));
        assert!(config.watermark_font_size.is_none());
    }
}
