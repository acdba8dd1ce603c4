use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::calendar::ViewMode;
use crate::config::themes::ThemeRegistry;

pub mod themes;

pub use themes::{Palette, ThemeName};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Postcal";
const APP_NAME: &str = "postcal";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            default_cfg.post_load(&self.paths);
            tracing::info!(path = %self.paths.config_file.display(), "wrote default config");
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("POSTCAL_CONFIG").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let log_dir = project_dirs
            .state_dir()
            .map(|dir| dir.join("logs"))
            .unwrap_or_else(|| project_dirs.data_dir().join("logs"));

        Ok(Self {
            config_dir,
            config_file,
            log_dir,
        })
    }

    /// Paths rooted under a single directory instead of the platform locations.
    pub fn rooted(root: &Path) -> Self {
        Self {
            config_dir: root.to_path_buf(),
            config_file: root.join("config.toml"),
            log_dir: root.join("logs"),
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("postcal.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub theme: ThemeName,
    pub default_view: ViewMode,
    /// JSON file with the posts to load at startup; relative paths resolve
    /// against the config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<PathBuf>,
    pub tick_rate_ms: u64,
    pub max_label_lines: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: ThemeName::Dark,
            default_view: ViewMode::Month,
            seed_file: None,
            tick_rate_ms: 250,
            max_label_lines: 3,
        }
    }
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        if let Some(seed) = &self.seed_file {
            if seed.is_relative() {
                self.seed_file = Some(paths.config_dir.join(seed));
            }
        }
        if !ThemeRegistry::default().contains(&self.theme) {
            tracing::warn!(?self.theme, "unknown theme in config, falling back to Dark");
            self.theme = ThemeName::Dark;
        }
        if self.tick_rate_ms == 0 {
            tracing::warn!("tick_rate_ms must be positive, using 250");
            self.tick_rate_ms = 250;
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    pub fn palette(&self) -> Palette {
        ThemeRegistry::default().palette(&self.theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_load_writes_defaults() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let loader = ConfigLoader::with_paths(ConfigPaths::rooted(temp.path()));
        let cfg = loader.load_or_init()?;
        assert_eq!(cfg.default_view, ViewMode::Month);
        assert_eq!(cfg.tick_rate_ms, 250);
        assert!(loader.paths().config_file.exists());
        assert!(loader.paths().log_dir.is_dir());

        let reloaded = loader.load()?;
        assert_eq!(reloaded.theme, ThemeName::Dark);
        assert_eq!(reloaded.max_label_lines, 3);
        assert!(reloaded.seed_file.is_none());
        Ok(())
    }

    #[test]
    fn partial_config_keeps_defaults_and_resolves_seed_path() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        fs::write(
            &paths.config_file,
            "default_view = \"week\"\ntheme = \"light\"\nseed_file = \"posts.json\"\ntick_rate_ms = 0\n",
        )?;
        let cfg = ConfigLoader::with_paths(paths.clone()).load()?;
        assert_eq!(cfg.default_view, ViewMode::Week);
        assert_eq!(cfg.theme, ThemeName::Light);
        assert_eq!(cfg.seed_file, Some(paths.config_dir.join("posts.json")));
        assert_eq!(cfg.tick_rate(), Duration::from_millis(250));
        assert_eq!(cfg.max_label_lines, 3);
        Ok(())
    }

    #[test]
    fn unknown_theme_falls_back_to_dark() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        fs::write(
            &paths.config_file,
            "theme = \"solarized\"\ndefault_view = \"week\"\n",
        )?;
        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.theme, ThemeName::Dark);
        assert_eq!(cfg.default_view, ViewMode::Week);
        assert_eq!(cfg.palette(), AppConfig::default().palette());
        Ok(())
    }

    #[test]
    fn malformed_config_reports_context() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        fs::write(&paths.config_file, "default_view = [")?;
        let err = ConfigLoader::with_paths(paths)
            .load()
            .expect_err("invalid toml");
        assert!(err.to_string().contains("parsing config toml"));
        Ok(())
    }
}
