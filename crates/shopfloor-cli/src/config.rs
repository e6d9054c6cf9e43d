// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use shopfloor_app::{PageSize, Screen};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "shopfloor";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "warn";
const TOKEN_ENV: &str = "SHOPFLOOR_API_TOKEN";
const DATA_DIR_ENV: &str = "SHOPFLOOR_DATA_DIR";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            token: None,
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub start_screen: Option<String>,
    pub page_size: Option<usize>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            start_screen: Some(Screen::Dashboard.label().to_owned()),
            page_size: Some(PageSize::default().get()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("SHOPFLOOR_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set SHOPFLOOR_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and keep values under [api], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.api.base_url
            && base_url.trim().is_empty()
        {
            bail!(
                "api.base_url in {} must not be empty; remove it to use {DEFAULT_BASE_URL}",
                path.display()
            );
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(screen) = &self.ui.start_screen
            && Screen::parse(screen).is_none()
        {
            bail!(
                "ui.start_screen in {} is {:?}; expected one of: {}",
                path.display(),
                screen,
                screen_names()
            );
        }

        if let Some(rows) = self.ui.page_size
            && PageSize::from_rows(rows).is_none()
        {
            bail!(
                "ui.page_size in {} is {}; expected one of: {}",
                path.display(),
                rows,
                page_size_names()
            );
        }

        if let Some(level) = &self.log.level
            && tracing_subscriber::EnvFilter::try_new(level).is_err()
        {
            bail!(
                "log.level in {} is {:?}; use a level like warn or a directive like shopfloor_api=debug",
                path.display(),
                level
            );
        }

        Ok(())
    }

    pub fn api_base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim()
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    /// `SHOPFLOOR_API_TOKEN`, then `[api].token`, then the saved token file.
    pub fn api_token(&self) -> Result<Option<String>> {
        if let Some(token) = env::var(TOKEN_ENV).ok().and_then(non_blank) {
            return Ok(Some(token));
        }
        if let Some(token) = self.api.token.clone().and_then(non_blank) {
            return Ok(Some(token));
        }

        let path = token_path()?;
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read saved token {}", path.display()))?;
        Ok(non_blank(raw))
    }

    pub fn start_screen(&self) -> Screen {
        self.ui
            .start_screen
            .as_deref()
            .and_then(Screen::parse)
            .unwrap_or(Screen::Dashboard)
    }

    pub fn page_size(&self) -> PageSize {
        self.ui
            .page_size
            .and_then(PageSize::from_rows)
            .unwrap_or_default()
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log.file {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(data_dir()?.join("shopfloor.log")),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# shopfloor config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\n# Optional. SHOPFLOOR_API_TOKEN or `shopfloor --save-token` also work.\n# token = \"...\"\ntimeout = \"{}\"\n\n[ui]\n# One of: {}\nstart_screen = \"dashboard\"\n# One of: {}\npage_size = {}\n\n[log]\nlevel = \"{}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/shopfloor/shopfloor.log)\n# file = \"/absolute/path/to/shopfloor.log\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            screen_names(),
            page_size_names(),
            PageSize::default().get(),
            DEFAULT_LOG_LEVEL,
        )
    }
}

/// Per-user data directory holding the saved token and the TUI log.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(path) = env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }
    let data_root = dirs::data_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set {DATA_DIR_ENV} to a writable directory")
    })?;
    Ok(data_root.join(APP_NAME))
}

pub fn token_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("token"))
}

/// Persist `token` for later runs and return where it was written.
pub fn save_token(token: &str) -> Result<PathBuf> {
    let token = token.trim();
    if token.is_empty() {
        bail!("--save-token needs a non-empty token");
    }

    let path = token_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create data directory {}", parent.display()))?;
    }
    fs::write(&path, format!("{token}\n"))
        .with_context(|| format!("write token file {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restrict permissions on {}", path.display()))?;
    }

    Ok(path)
}

fn non_blank(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn screen_names() -> String {
    Screen::ALL
        .iter()
        .map(|screen| screen.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn page_size_names() -> String {
    PageSize::ALL
        .iter()
        .map(|size| size.get().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
