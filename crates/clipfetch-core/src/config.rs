use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Twitch Helix credentials and clip listing window (`[twitch]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitchConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Channel login whose clips are listed.
    pub channel: String,
    /// Only clips created in the last N days are listed.
    pub days_back: i64,
    /// Clips with fewer views are dropped from the plan.
    pub min_views: u64,
    /// OAuth token endpoint (client-credentials flow).
    pub token_url: String,
    /// Helix API base, without trailing slash.
    pub api_base: String,
    /// Page size for clip listing (Helix maximum is 100).
    pub page_size: u32,
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            channel: String::new(),
            days_back: 30,
            min_views: 250,
            token_url: "https://id.twitch.tv/oauth2/token".to_string(),
            api_base: "https://api.twitch.tv/helix".to_string(),
            page_size: 100,
        }
    }
}

/// Headless browser and media discovery settings (`[browser]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Chromium/Chrome binary; None = let the driver locate one.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    /// Hard limit for the initial page navigation.
    pub navigation_timeout_secs: u64,
    /// Fixed wait after navigation before polling starts.
    pub settle_ms: u64,
    /// Number of network poll checks after settling.
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
    /// Limit for reading the `<video>` source in the DOM fallback.
    pub dom_timeout_secs: u64,
    /// Response content-type prefixes treated as media streams.
    pub media_content_types: Vec<String>,
    /// URL path suffixes treated as media files.
    pub media_extensions: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36"
                .to_string(),
            navigation_timeout_secs: 30,
            settle_ms: 1000,
            poll_attempts: 6,
            poll_interval_ms: 1000,
            dom_timeout_secs: 5,
            media_content_types: vec!["video/mp4".to_string()],
            media_extensions: vec![".mp4".to_string()],
        }
    }
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn dom_timeout(&self) -> Duration {
        Duration::from_secs(self.dom_timeout_secs)
    }
}

/// External downloader used in download mode (`[downloader]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Program invoked once per clip.
    pub program: String,
    /// Extra arguments inserted before the fixed ones.
    pub extra_args: Vec<String>,
    /// Per-clip limit for the external process.
    pub timeout_secs: u64,
    /// Directory holding downloaded clips. Files in here that belong to no
    /// planned clip are deleted at the end of a download run.
    pub download_dir: PathBuf,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            extra_args: Vec::new(),
            timeout_secs: 300,
            download_dir: PathBuf::from("clips"),
        }
    }
}

/// Global configuration loaded from `~/.config/clipfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipfetchConfig {
    /// Maximum number of clips resolved at the same time.
    pub concurrency: usize,
    /// Output JSON path; None = `<channel>_mp4_urls.json` (or `_clips.json` in clips mode).
    pub output_file: Option<PathBuf>,
    /// Plain-text run log, overwritten on every run.
    pub run_log_file: PathBuf,
    /// In URL mode, write `{url, date}` objects instead of bare URL strings.
    pub dated_output: bool,
    pub twitch: TwitchConfig,
    pub browser: BrowserSettings,
    pub downloader: DownloaderConfig,
}

impl Default for ClipfetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            output_file: None,
            run_log_file: PathBuf::from("clipfetch_run.log"),
            dated_output: false,
            twitch: TwitchConfig::default(),
            browser: BrowserSettings::default(),
            downloader: DownloaderConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("clipfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ClipfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ClipfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ClipfetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
