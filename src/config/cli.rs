use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::domain::theme::{RenderProfile, Variant};

/// Command-line arguments for the naas binary.
#[derive(Debug, Parser)]
#[command(name = "naas", version, about = "No-as-a-Service: rejection reasons as JSON or PNG")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "NAAS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Render a single card to a PNG file.
    Render(RenderArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

/// Settings shared by every command that draws cards.
#[derive(Debug, Args, Default, Clone)]
pub struct ThemeOverrides {
    /// Override the card background color (`#rrggbb`).
    #[arg(long = "theme-background", value_name = "HEX")]
    pub background_color: Option<String>,

    /// Override the card text color (`#rrggbb`).
    #[arg(long = "theme-text", value_name = "HEX")]
    pub text_color: Option<String>,

    /// Override the font family used for themed cards.
    #[arg(long = "theme-font-family", value_name = "FAMILY")]
    pub font_family: Option<String>,

    /// Override the directory scanned for `.ttf`/`.otf` files.
    #[arg(long = "fonts-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub fonts_directory: Option<PathBuf>,

    /// Override the horizontal padding as a fraction of the card width.
    #[arg(long = "images-padding-fraction", value_name = "FRACTION")]
    pub padding_fraction: Option<f32>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub theme: ThemeOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle the image routes.
    #[arg(
        long = "images-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub images_enabled: Option<bool>,

    /// Override the reasons file.
    #[arg(long = "reasons-path", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub reasons_path: Option<PathBuf>,

    /// Override the static files directory.
    #[arg(long = "static-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub static_directory: Option<PathBuf>,

    /// Override the rate limit window size.
    #[arg(long = "rate-limit-window-seconds", value_name = "SECONDS")]
    pub rate_limit_window_seconds: Option<u64>,

    /// Override the rate limit request ceiling.
    #[arg(long = "rate-limit-max-requests", value_name = "COUNT")]
    pub rate_limit_max_requests: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub theme: ThemeOverrides,

    /// Card size: s, m, l or full.
    #[arg(long, default_value = "full", value_parser = clap::value_parser!(Variant))]
    pub variant: Variant,

    /// Render profile: themed or plain.
    #[arg(long, default_value = "themed", value_parser = clap::value_parser!(RenderProfile))]
    pub style: RenderProfile,

    /// Text to draw; a random reason is used when omitted.
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// Override the reasons file used when no text is given.
    #[arg(long = "reasons-path", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub reasons_path: Option<PathBuf>,

    /// Where to write the PNG.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}
