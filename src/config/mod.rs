//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    env,
    net::SocketAddr,
    num::NonZeroU32,
    path::PathBuf,
    str::FromStr,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::{
    application::render::DEFAULT_PADDING_FRACTION,
    domain::theme::{DEFAULT_BACKGROUND, DEFAULT_TEXT, GENERIC_SANS_SERIF, HexColor, Theme},
};

mod cli;

pub use cli::{CliArgs, Command, RenderArgs, ServeArgs, ServeOverrides, ThemeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "naas";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_FONTS_DIR: &str = "fonts";
const DEFAULT_REASONS_PATH: &str = "reasons.json";
const DEFAULT_STATIC_DIR: &str = "public";
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u64 = 120;

/// Environment names written by the original `.env` setup wizard.
const LEGACY_PORT: &str = "PORT";
const LEGACY_ENABLE_IMAGES: &str = "ENABLE_IMAGES";
const LEGACY_BG_COLOR: &str = "IMG_BG_COLOR";
const LEGACY_TEXT_COLOR: &str = "IMG_TEXT_COLOR";
const LEGACY_FONT_FAMILY: &str = "IMG_FONT_FAMILY";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub images: ImageSettings,
    pub theme: Theme,
    pub fonts: FontSettings,
    pub reasons: ReasonSettings,
    pub rate_limit: RateLimitSettings,
    pub static_files: StaticSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub enabled: bool,
    /// Horizontal padding on each side as a fraction of the width, in `[0, 0.5)`.
    pub padding_fraction: f32,
}

#[derive(Debug, Clone)]
pub struct FontSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ReasonSettings {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub window_seconds: NonZeroU32,
    pub max_requests: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct StaticSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("NAAS").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_legacy_env(|key| env::var(key).ok())?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Render(args)) => raw.apply_render_overrides(args),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    images: RawImageSettings,
    theme: RawThemeSettings,
    fonts: RawFontSettings,
    reasons: RawReasonSettings,
    rate_limit: RawRateLimitSettings,
    static_files: RawStaticSettings,
}

impl RawSettings {
    /// Layer the wizard-era variables over file and `NAAS__*` settings.
    fn apply_legacy_env<F>(&mut self, lookup: F) -> Result<(), LoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(LEGACY_PORT) {
            let port = port.trim().parse::<u16>().map_err(|err| {
                LoadError::invalid("PORT", format!("`{port}` is not a port number: {err}"))
            })?;
            self.server.port = Some(port);
        }
        if let Some(enabled) = lookup(LEGACY_ENABLE_IMAGES) {
            self.images.enabled = Some(enabled.trim().eq_ignore_ascii_case("true"));
        }
        if let Some(color) = lookup(LEGACY_BG_COLOR) {
            self.theme.background_color = Some(color);
        }
        if let Some(color) = lookup(LEGACY_TEXT_COLOR) {
            self.theme.text_color = Some(color);
        }
        if let Some(family) = lookup(LEGACY_FONT_FAMILY) {
            self.theme.font_family = Some(family);
        }
        Ok(())
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.images_enabled {
            self.images.enabled = Some(enabled);
        }
        if let Some(path) = overrides.reasons_path.as_ref() {
            self.reasons.path = Some(path.clone());
        }
        if let Some(directory) = overrides.static_directory.as_ref() {
            self.static_files.directory = Some(directory.clone());
        }
        if let Some(window) = overrides.rate_limit_window_seconds {
            self.rate_limit.window_seconds = Some(window);
        }
        if let Some(max) = overrides.rate_limit_max_requests {
            self.rate_limit.max_requests = Some(max);
        }

        self.apply_theme_overrides(&overrides.theme);
    }

    fn apply_render_overrides(&mut self, args: &RenderArgs) {
        if let Some(path) = args.reasons_path.as_ref() {
            self.reasons.path = Some(path.clone());
        }
        self.apply_theme_overrides(&args.theme);
    }

    fn apply_theme_overrides(&mut self, overrides: &ThemeOverrides) {
        if let Some(color) = overrides.background_color.as_ref() {
            self.theme.background_color = Some(color.clone());
        }
        if let Some(color) = overrides.text_color.as_ref() {
            self.theme.text_color = Some(color.clone());
        }
        if let Some(family) = overrides.font_family.as_ref() {
            self.theme.font_family = Some(family.clone());
        }
        if let Some(directory) = overrides.fonts_directory.as_ref() {
            self.fonts.directory = Some(directory.clone());
        }
        if let Some(fraction) = overrides.padding_fraction {
            self.images.padding_fraction = Some(fraction);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            images,
            theme,
            fonts,
            reasons,
            rate_limit,
            static_files,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            images: build_image_settings(images)?,
            theme: build_theme(theme)?,
            fonts: FontSettings {
                directory: non_empty_path(fonts.directory, DEFAULT_FONTS_DIR, "fonts.directory")?,
            },
            reasons: ReasonSettings {
                path: non_empty_path(reasons.path, DEFAULT_REASONS_PATH, "reasons.path")?,
            },
            rate_limit: build_rate_limit_settings(rate_limit)?,
            static_files: StaticSettings {
                directory: non_empty_path(
                    static_files.directory,
                    DEFAULT_STATIC_DIR,
                    "static_files.directory",
                )?,
            },
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_image_settings(images: RawImageSettings) -> Result<ImageSettings, LoadError> {
    let padding_fraction = images.padding_fraction.unwrap_or(DEFAULT_PADDING_FRACTION);
    if !(0.0..0.5).contains(&padding_fraction) {
        return Err(LoadError::invalid(
            "images.padding_fraction",
            format!("{padding_fraction} is outside [0, 0.5)"),
        ));
    }

    Ok(ImageSettings {
        enabled: images.enabled.unwrap_or(true),
        padding_fraction,
    })
}

fn build_theme(theme: RawThemeSettings) -> Result<Theme, LoadError> {
    let background = parse_color(
        theme.background_color,
        DEFAULT_BACKGROUND,
        "theme.background_color",
    )?;
    let text = parse_color(theme.text_color, DEFAULT_TEXT, "theme.text_color")?;

    let font_family = theme
        .font_family
        .map(|family| family.trim().trim_matches('"').trim().to_string())
        .filter(|family| !family.is_empty())
        .unwrap_or_else(|| GENERIC_SANS_SERIF.to_string());

    Ok(Theme {
        background,
        text,
        font_family,
    })
}

fn parse_color(
    value: Option<String>,
    default: HexColor,
    key: &'static str,
) -> Result<HexColor, LoadError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err| LoadError::invalid(key, format!("`{raw}`: {err}"))),
        None => Ok(default),
    }
}

fn build_rate_limit_settings(
    rate_limit: RawRateLimitSettings,
) -> Result<RateLimitSettings, LoadError> {
    let window_seconds_val = rate_limit
        .window_seconds
        .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS);
    let window_seconds = non_zero_u32(window_seconds_val, "rate_limit.window_seconds")?;

    let max_requests_val = rate_limit
        .max_requests
        .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS);
    let max_requests = non_zero_u32(max_requests_val, "rate_limit.max_requests")?;

    Ok(RateLimitSettings {
        window_seconds,
        max_requests,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawImageSettings {
    enabled: Option<bool>,
    padding_fraction: Option<f32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawThemeSettings {
    background_color: Option<String>,
    text_color: Option<String>,
    font_family: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFontSettings {
    directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawReasonSettings {
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRateLimitSettings {
    window_seconds: Option<u64>,
    max_requests: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStaticSettings {
    directory: Option<PathBuf>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_empty_path(
    value: Option<PathBuf>,
    default: &str,
    key: &'static str,
) -> Result<PathBuf, LoadError> {
    let path = value.unwrap_or_else(|| PathBuf::from(default));
    if path.as_os_str().is_empty() {
        return Err(LoadError::invalid(key, "path must not be empty"));
    }
    Ok(path)
}

#[cfg(test)]
mod tests;
