use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::collections::BTreeMap;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::widgets::{FontChoice, HAlign};

const DEFAULT_WIDTH: u32 = 296;
const DEFAULT_HEIGHT: u32 = 128;
const DEFAULT_BORDER: u32 = 10;
const DEFAULT_TICK_SECS: u64 = 30;
const DEFAULT_FULL_REFRESH_EVERY: u32 = 10;
const DEFAULT_PREVIEW_SCALE: u32 = 3;

// Waveshare e-Paper HAT wiring (BCM numbering)
const DEFAULT_SPIDEV: &str = "/dev/spidev0.0";
const DEFAULT_GPIOCHIP: &str = "/dev/gpiochip0";
const DEFAULT_BUSY_PIN: u32 = 24;
const DEFAULT_DC_PIN: u32 = 25;
const DEFAULT_RST_PIN: u32 = 17;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// where values come from
    pub source: Option<SourceConfig>,
    /// panel geometry & behavior
    pub display: Option<DisplayConfig>,
    /// data-key-to-widget bindings; empty = built-in demo screen
    #[serde(default)]
    pub widgets: Vec<WidgetConfig>,
}

impl Config {
    pub fn display_or_default(&self) -> DisplayConfig {
        self.display.clone().unwrap_or_default()
    }

    pub fn source_or_default(&self) -> SourceConfig {
        self.source.clone().unwrap_or_else(|| SourceConfig::Mqtt {
            host: "localhost".to_string(),
            port: None,
            client_id: None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Mqtt {
        host: String,          // broker host
        port: Option<u16>,     // default 1883
        client_id: Option<String>,
    },
    Signalk {
        url: String,           // full-model REST endpoint
        period_secs: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Epd2in9,
    Preview,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// 0 disables the screen outline; only worth enabling in preview
    pub border: Option<u32>,
    pub sink: Option<SinkKind>,
    /// periodic re-render interval
    pub tick_secs: Option<u64>,
    /// force a full refresh after this many partials (ghosting control)
    pub full_refresh_every: Option<u32>,
    /// preview window pixel scale
    pub scale: Option<u32>,
    pub spidev: Option<String>,
    pub gpiochip: Option<String>,
    pub busy_pin: Option<u32>,
    pub dc_pin: Option<u32>,
    pub rst_pin: Option<u32>,
}

impl DisplayConfig {
    pub fn width(&self) -> u32 { self.width.unwrap_or(DEFAULT_WIDTH) }
    pub fn height(&self) -> u32 { self.height.unwrap_or(DEFAULT_HEIGHT) }
    pub fn border(&self) -> u32 { self.border.unwrap_or(DEFAULT_BORDER) }
    pub fn sink(&self) -> SinkKind { self.sink.unwrap_or(SinkKind::Epd2in9) }
    pub fn tick_secs(&self) -> u64 { self.tick_secs.unwrap_or(DEFAULT_TICK_SECS) }
    pub fn full_refresh_every(&self) -> u32 {
        self.full_refresh_every.unwrap_or(DEFAULT_FULL_REFRESH_EVERY)
    }
    pub fn scale(&self) -> u32 { self.scale.unwrap_or(DEFAULT_PREVIEW_SCALE) }
    pub fn spidev(&self) -> &str { self.spidev.as_deref().unwrap_or(DEFAULT_SPIDEV) }
    pub fn gpiochip(&self) -> &str { self.gpiochip.as_deref().unwrap_or(DEFAULT_GPIOCHIP) }
    pub fn busy_pin(&self) -> u32 { self.busy_pin.unwrap_or(DEFAULT_BUSY_PIN) }
    pub fn dc_pin(&self) -> u32 { self.dc_pin.unwrap_or(DEFAULT_DC_PIN) }
    pub fn rst_pin(&self) -> u32 { self.rst_pin.unwrap_or(DEFAULT_RST_PIN) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    #[default]
    Text,
    Bar,
    Icon,
}

/// One (widget, region, data-key) binding.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WidgetConfig {
    pub kind: WidgetKind,
    /// MQTT topic or SignalK path; omit for static decorations
    pub key: Option<String>,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    // text options
    pub font: Option<FontChoice>,
    pub halign: Option<HAlign>,
    pub decimals: Option<u32>,
    pub suffix: Option<String>,
    pub fallback: Option<String>,
    // bar options
    pub min: Option<f64>,
    pub max: Option<f64>,
    // icon options: a fixed glyph, or a state -> glyph mapping
    pub icon: Option<String>,
    #[serde(default)]
    pub map: BTreeMap<String, String>,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "InkMonS", version, about = "E-paper data dashboard for MQTT and SignalK feeds")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(short = 'c', long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Render to a preview window instead of the e-paper panel
    #[arg(short = 's', long = "screen", action = ArgAction::SetTrue)]
    pub screen: bool,
    /// Enable debug log level
    #[arg(short = 'v', long = "debug", alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long)]
    pub broker_host: Option<String>,
    #[arg(long)]
    pub broker_port: Option<u16>,
    #[arg(long)]
    pub client_id: Option<String>,
    #[arg(long)]
    pub display_width: Option<u32>,
    #[arg(long)]
    pub display_height: Option<u32>,
    #[arg(long)]
    pub display_border: Option<u32>,
    #[arg(long)]
    pub tick_secs: Option<u64>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();

    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, &cli);

    // 4) Validate
    validate(&cfg)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/inkmons/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/inkmons/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/inkmons.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["inkmons.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some() { dst.log_level = src.log_level; }
    if src.source.is_some()    { dst.source = src.source; }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
    if !src.widgets.is_empty() { dst.widgets = src.widgets; }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.width.is_some()              { dst.width = src.width; }
    if src.height.is_some()             { dst.height = src.height; }
    if src.border.is_some()             { dst.border = src.border; }
    if src.sink.is_some()               { dst.sink = src.sink; }
    if src.tick_secs.is_some()          { dst.tick_secs = src.tick_secs; }
    if src.full_refresh_every.is_some() { dst.full_refresh_every = src.full_refresh_every; }
    if src.scale.is_some()              { dst.scale = src.scale; }
    if src.spidev.is_some()             { dst.spidev = src.spidev; }
    if src.gpiochip.is_some()           { dst.gpiochip = src.gpiochip; }
    if src.busy_pin.is_some()           { dst.busy_pin = src.busy_pin; }
    if src.dc_pin.is_some()             { dst.dc_pin = src.dc_pin; }
    if src.rst_pin.is_some()            { dst.rst_pin = src.rst_pin; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.debug               { cfg.log_level = Some("debug".to_string()); }

    let any_display = cli.screen
        || cli.display_width.is_some()
        || cli.display_height.is_some()
        || cli.display_border.is_some()
        || cli.tick_secs.is_some();

    if any_display && cfg.display.is_none() {
        cfg.display = Some(DisplayConfig::default());
    }
    if let Some(display) = cfg.display.as_mut() {
        if cli.screen                    { display.sink = Some(SinkKind::Preview); }
        if cli.display_width.is_some()   { display.width = cli.display_width; }
        if cli.display_height.is_some()  { display.height = cli.display_height; }
        if cli.display_border.is_some()  { display.border = cli.display_border; }
        if cli.tick_secs.is_some()       { display.tick_secs = cli.tick_secs; }
    }

    let any_broker =
        cli.broker_host.is_some() || cli.broker_port.is_some() || cli.client_id.is_some();
    if any_broker {
        match cfg.source.as_mut() {
            Some(SourceConfig::Mqtt { host, port, client_id }) => {
                if let Some(h) = &cli.broker_host { *host = h.clone(); }
                if cli.broker_port.is_some()      { *port = cli.broker_port; }
                if cli.client_id.is_some()        { *client_id = cli.client_id.clone(); }
            }
            Some(SourceConfig::Signalk { .. }) => {
                // broker flags don't apply to a signalk feed; leave it alone
            }
            None => {
                cfg.source = Some(SourceConfig::Mqtt {
                    host: cli.broker_host.clone().unwrap_or_else(|| "localhost".to_string()),
                    port: cli.broker_port,
                    client_id: cli.client_id.clone(),
                });
            }
        }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(SourceConfig::Signalk { period_secs: Some(0), .. }) = cfg.source.as_ref() {
        return Err(ConfigError::Validation("signalk period_secs must be >= 1".into()));
    }

    if let Some(display) = cfg.display.as_ref() {
        if let (Some(w), Some(h)) = (display.width, display.height) {
            if w == 0 || h == 0 {
                return Err(ConfigError::Validation("display width/height must be > 0".into()));
            }
        }
        if let Some(t) = display.tick_secs {
            if t == 0 {
                return Err(ConfigError::Validation("display tick_secs must be >= 1".into()));
            }
        }
        if let Some(s) = display.scale {
            if s == 0 || s > 16 {
                return Err(ConfigError::Validation("display scale must be 1..=16".into()));
            }
        }
    }

    for (i, w) in cfg.widgets.iter().enumerate() {
        if w.w == 0 || w.h == 0 {
            return Err(ConfigError::Validation(format!(
                "widget {i}: region must have non-zero size"
            )));
        }
        if let (Some(min), Some(max)) = (w.min, w.max) {
            if min >= max {
                return Err(ConfigError::Validation(format!(
                    "widget {i}: min must be < max"
                )));
            }
        }
        if let Some(d) = w.decimals {
            if d > 6 {
                return Err(ConfigError::Validation(format!(
                    "widget {i}: decimals must be <= 6"
                )));
            }
        }
        if w.kind == WidgetKind::Icon && w.icon.is_none() && w.map.is_empty() {
            return Err(ConfigError::Validation(format!(
                "widget {i}: icon widget needs 'icon' or a 'map'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_defaults() -> Cli {
        Cli {
            config: None,
            screen: false,
            debug: false,
            log_level: None,
            broker_host: None,
            broker_port: None,
            client_id: None,
            display_width: None,
            display_height: None,
            display_border: None,
            tick_secs: None,
            dump_config: false,
        }
    }

    #[test]
    fn yaml_round_trip() {
        let doc = r#"
log_level: info
source:
  type: mqtt
  host: broker.local
  port: 1884
  client_id: battmon
display:
  width: 296
  height: 128
  border: 10
  full_refresh_every: 6
widgets:
  - kind: text
    key: battery/voltage
    x: 10
    y: 10
    w: 80
    h: 24
    decimals: 1
    suffix: " V"
    halign: right
    font: large
  - kind: icon
    key: system/state
    x: 100
    y: 10
    w: 24
    h: 24
    map:
      charging: plug
      low: warn
"#;
        let cfg: Config = serde_yaml::from_str(doc).unwrap();
        assert!(matches!(
            cfg.source,
            Some(SourceConfig::Mqtt { ref host, port: Some(1884), .. }) if host == "broker.local"
        ));
        assert_eq!(cfg.display_or_default().full_refresh_every(), 6);
        assert_eq!(cfg.widgets.len(), 2);
        assert_eq!(cfg.widgets[0].halign, Some(HAlign::Right));
        assert_eq!(cfg.widgets[1].map.get("low"), Some(&"warn".to_string()));
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn cli_overrides_beat_yaml() {
        let mut cfg: Config = serde_yaml::from_str(
            "source:\n  type: mqtt\n  host: from-yaml\ndisplay:\n  width: 296\n",
        )
        .unwrap();

        let mut cli = cli_defaults();
        cli.screen = true;
        cli.debug = true;
        cli.broker_host = Some("from-cli".into());
        apply_cli_overrides(&mut cfg, &cli);

        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.display_or_default().sink(), SinkKind::Preview);
        assert!(matches!(
            cfg.source,
            Some(SourceConfig::Mqtt { ref host, .. }) if host == "from-cli"
        ));
    }

    #[test]
    fn screen_flag_works_without_a_display_section() {
        let mut cfg = Config::default();
        let mut cli = cli_defaults();
        cli.screen = true;
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.display_or_default().sink(), SinkKind::Preview);
    }

    #[test]
    fn validation_rejects_nonsense() {
        let zero: Config =
            serde_yaml::from_str("display:\n  width: 0\n  height: 128\n").unwrap();
        assert!(validate(&zero).is_err());

        let bad_bar: Config = serde_yaml::from_str(
            "widgets:\n  - kind: bar\n    x: 0\n    y: 0\n    w: 10\n    h: 10\n    min: 50\n    max: 50\n",
        )
        .unwrap();
        assert!(validate(&bad_bar).is_err());

        let bare_icon: Config = serde_yaml::from_str(
            "widgets:\n  - kind: icon\n    x: 0\n    y: 0\n    w: 24\n    h: 24\n",
        )
        .unwrap();
        assert!(validate(&bare_icon).is_err());
    }
}
