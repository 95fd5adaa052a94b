// Configuration module for filmography-stats
// Handles XDG-compliant directory paths and TOML configuration file

use serde::Deserialize;
use std::path::PathBuf;

use crate::render::layout::{LayoutOverride, PosterLayout};
use crate::services::{omdb, scraper};

const APP_NAME: &str = "filmography-stats";
const CONFIG_FILENAME: &str = "config.toml";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Directory paths (overrides XDG defaults)
    pub paths: PathsConfig,

    /// Metadata provider configuration
    pub metadata: MetadataConfig,

    /// Celebrity page scraping
    pub scraper: ScraperConfig,

    /// Price index used for inflation adjustment
    pub inflation: InflationConfig,

    /// External tools configuration
    pub tools: ToolsConfig,

    /// Poster and video rendering
    pub render: RenderConfig,

    /// Actors processed when none are given on the command line
    pub actors: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Override data directory (database, generated output)
    pub data_dir: Option<PathBuf>,

    /// Override cache directory (downloaded posters and portraits)
    pub cache_dir: Option<PathBuf>,

    /// Override config directory
    pub config_dir: Option<PathBuf>,

    /// Override output directory (CSV, images, videos)
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// OMDb API key (required for collection)
    pub omdb_api_key: Option<String>,

    /// OMDb endpoint
    pub omdb_base_url: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            omdb_api_key: None,
            omdb_base_url: omdb::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Celebrity page base URL; the actor slug is appended
    pub base_url: String,

    pub user_agent: String,

    /// HTTP timeout in seconds for every outgoing request
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: scraper::DEFAULT_BASE_URL.to_string(),
            user_agent: scraper::DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InflationConfig {
    /// CSV of `year,index` rows replacing the embedded CPI-U table
    pub cpi_table: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// TTF/OTF font for text overlays (system fonts are searched if unset)
    pub font_path: Option<PathBuf>,

    /// Background image for movie film-strip frames
    pub template_path: Option<PathBuf>,

    /// Directory holding FreshTomato.png, RottenTomato.png, FreshPopcorn.png, RottenPopcorn.png
    pub icons_dir: Option<PathBuf>,

    /// Slot overrides for one movie frame
    pub film_strip: LayoutOverride,

    /// Slot overrides for the actor summary frame
    pub actor_card: LayoutOverride,

    pub video: VideoConfig,
}

impl RenderConfig {
    pub fn film_strip_layout(&self) -> PosterLayout {
        PosterLayout::film_strip().with_overrides(&self.film_strip)
    }

    pub fn actor_card_layout(&self) -> PosterLayout {
        PosterLayout::actor_card().with_overrides(&self.actor_card)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Output width; the source image is resized to this width (default: 1080)
    pub width: u32,

    /// Viewport height (default: 1920)
    pub height: u32,

    /// Frames per second (default: 60)
    pub fps: u32,

    /// Video length in seconds (default: 10)
    pub duration_secs: f64,

    /// Append the first viewport to the end so the video loops seamlessly
    pub looping: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 60,
            duration_secs: 10.0,
            looping: false,
        }
    }
}

/// Application paths following XDG Base Directory Specification on Unix
/// On other platforms, falls back to the current directory or platform-specific locations
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for configuration files (config.toml, icons)
    /// XDG: $XDG_CONFIG_HOME/filmography-stats or ~/.config/filmography-stats
    pub config_dir: PathBuf,

    /// Directory for persistent data (database)
    /// XDG: $XDG_DATA_HOME/filmography-stats or ~/.local/share/filmography-stats
    pub data_dir: PathBuf,

    /// Directory for downloaded images
    /// XDG: $XDG_CACHE_HOME/filmography-stats or ~/.cache/filmography-stats
    pub cache_dir: PathBuf,

    /// Directory for generated CSV, posters and videos
    pub output_dir: PathBuf,
}

impl AppPaths {
    /// Create application paths using XDG directories (or fallbacks)
    ///
    /// Priority order:
    /// 1. Environment variables (FILMOGRAPHY_STATS_CONFIG_DIR, FILMOGRAPHY_STATS_DATA_DIR, FILMOGRAPHY_STATS_CACHE_DIR)
    /// 2. Config file overrides
    /// 3. XDG directories (Linux/Unix)
    /// 4. Platform-specific directories (macOS, Windows)
    /// 5. Current directory fallback
    pub fn new(config_overrides: &PathsConfig) -> Self {
        let config_dir = resolve_dir(
            "FILMOGRAPHY_STATS_CONFIG_DIR",
            &config_overrides.config_dir,
            dirs::config_dir(),
            None,
        );
        let data_dir = resolve_dir(
            "FILMOGRAPHY_STATS_DATA_DIR",
            &config_overrides.data_dir,
            dirs::data_dir(),
            None,
        );
        let cache_dir = resolve_dir(
            "FILMOGRAPHY_STATS_CACHE_DIR",
            &config_overrides.cache_dir,
            dirs::cache_dir(),
            Some("cache"),
        );
        let output_dir = config_overrides
            .output_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("output"));

        Self {
            config_dir,
            data_dir,
            cache_dir,
            output_dir,
        }
    }

    /// Create application paths using current directory (portable mode)
    pub fn current_dir() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            config_dir: cwd.clone(),
            data_dir: cwd.clone(),
            cache_dir: cwd.join("cache"),
            output_dir: cwd.join("output"),
        }
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("filmography.db")
    }

    /// Get the database URL for SQLite
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.database_path().display())
    }

    /// Downloaded movie posters
    pub fn poster_dir(&self) -> PathBuf {
        self.cache_dir.join("posters")
    }

    /// Downloaded actor portraits
    pub fn portrait_dir(&self) -> PathBuf {
        self.cache_dir.join("portraits")
    }

    /// Ensure all directories exist
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.config_dir).await?;
        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::create_dir_all(self.poster_dir()).await?;
        tokio::fs::create_dir_all(self.portrait_dir()).await?;
        Ok(())
    }

    /// Log the configured paths
    pub fn log_paths(&self) {
        tracing::info!("Configuration directory: {}", self.config_dir.display());
        tracing::info!("Data directory: {}", self.data_dir.display());
        tracing::info!("Cache directory: {}", self.cache_dir.display());
        tracing::info!("Output directory: {}", self.output_dir.display());
        tracing::debug!("Database path: {}", self.database_path().display());
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new(&PathsConfig::default())
    }
}

/// env var > config file > platform dir > current directory
fn resolve_dir(
    env_var: &str,
    config_override: &Option<PathBuf>,
    platform_dir: Option<PathBuf>,
    cwd_subdir: Option<&str>,
) -> PathBuf {
    if let Ok(path) = std::env::var(env_var) {
        return PathBuf::from(path);
    }

    if let Some(ref path) = config_override {
        return path.clone();
    }

    if let Some(dir) = platform_dir {
        return dir.join(APP_NAME);
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match cwd_subdir {
        Some(sub) => cwd.join(sub),
        None => cwd,
    }
}

/// Application configuration - combines TOML file with environment overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application paths
    pub paths: AppPaths,

    /// OMDb API key (optional until collection runs)
    pub omdb_api_key: Option<String>,

    pub omdb_base_url: String,

    pub scraper: ScraperConfig,

    /// CPI table override
    pub cpi_table: Option<PathBuf>,

    /// Path to ffmpeg binary
    pub ffmpeg_path: Option<PathBuf>,

    pub render: RenderConfig,

    /// Default actor list
    pub actors: Vec<String>,
}

impl AppConfig {
    /// Load configuration from TOML file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. TOML config file
    /// 3. Default values
    pub fn load() -> Self {
        let portable_mode = std::env::var("FILMOGRAPHY_STATS_PORTABLE")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        if portable_mode {
            tracing::info!("Running in portable mode (using current directory)");
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let config_file = Self::load_config_file(&cwd);
            return Self::with_paths(AppPaths::current_dir(), config_file);
        }

        let config_dir = Self::find_config_dir();
        let config_file = Self::load_config_file(&config_dir);
        Self::build(config_file)
    }

    /// Find the config directory (for locating config.toml)
    fn find_config_dir() -> PathBuf {
        if let Ok(path) = std::env::var("FILMOGRAPHY_STATS_CONFIG_DIR") {
            return PathBuf::from(path);
        }

        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_NAME);
        }

        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Load and parse the TOML config file
    fn load_config_file(config_dir: &std::path::Path) -> ConfigFile {
        let config_path = config_dir.join(CONFIG_FILENAME);

        if !config_path.exists() {
            tracing::debug!(
                "No config file found at {}, using defaults",
                config_path.display()
            );
            return ConfigFile::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config file {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    ConfigFile::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ConfigFile::default()
            }
        }
    }

    /// Build configuration from config file with environment overrides
    fn build(config_file: ConfigFile) -> Self {
        let paths = AppPaths::new(&config_file.paths);
        Self::with_paths(paths, config_file)
    }

    fn with_paths(paths: AppPaths, config_file: ConfigFile) -> Self {
        // OMDb API key: env > config
        let omdb_api_key = std::env::var("OMDB_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or(config_file.metadata.omdb_api_key);

        // FFmpeg path: env > config
        let ffmpeg_path = std::env::var("FFMPEG_PATH")
            .ok()
            .map(PathBuf::from)
            .or(config_file.tools.ffmpeg_path);

        Self {
            paths,
            omdb_api_key,
            omdb_base_url: config_file.metadata.omdb_base_url,
            scraper: config_file.scraper,
            cpi_table: config_file.inflation.cpi_table,
            ffmpeg_path,
            render: config_file.render,
            actors: config_file.actors,
        }
    }

    /// Get the database URL, with override from DATABASE_URL env var
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.paths.database_url())
    }

    /// Directory with score icons
    pub fn icons_dir(&self) -> PathBuf {
        self.render
            .icons_dir
            .clone()
            .unwrap_or_else(|| self.paths.config_dir.join("icons"))
    }

    /// ffmpeg binary, falling back to the one on PATH
    pub fn ffmpeg(&self) -> PathBuf {
        self.ffmpeg_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffmpeg"))
    }

    /// Log configuration status
    pub fn log_config(&self) {
        self.paths.log_paths();

        if self.omdb_api_key.is_some() {
            tracing::info!("Metadata provider: OMDb ({})", self.omdb_base_url);
        } else {
            tracing::warn!("No OMDb API key configured; collection is unavailable");
            tracing::info!("Hint: Add omdb_api_key to config.toml or set OMDB_API_KEY env var");
        }

        match self.cpi_table {
            Some(ref path) => tracing::info!("Price index: {}", path.display()),
            None => tracing::debug!("Price index: embedded CPI-U table"),
        }

        if let Some(ref path) = self.render.font_path {
            tracing::debug!("Font: {}", path.display());
        }
        tracing::debug!("FFmpeg: {}", self.ffmpeg().display());
        tracing::debug!("Configured actors: {}", self.actors.len());
    }
}
