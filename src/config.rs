use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;
use tracing::debug;

use crate::catalogue::Grouping;
use crate::chart_export::ChartExportOptions;
use crate::table::LoadOptions;
use crate::{Args, CompressionFormat};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Load config.toml from this directory layered over the defaults, then validate.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::default();
        let config_path = self.config_path("config.toml");
        if config_path.exists() {
            config.merge(AppConfig::from_file(&config_path)?);
            debug!(path = %config_path.display(), "loaded config file");
        }
        config.validate()?;
        Ok(config)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub data: DataConfig,
    pub display: DisplayConfig,
    pub chart: ChartConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub logging: LoggingConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    pub delimiter: Option<u8>,
    pub infer_schema_length: Option<usize>,
    pub compression: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub default_grouping: String,
    pub default_indexed: bool,
    pub default_view: String,
    pub show_preamble: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub show_legend: bool,
    pub show_markers: bool,
    pub export_width: u32,
    pub export_height: u32,
    pub export_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub error: String,
    pub dimmed: String,
    pub controls_bg: String,
    pub header_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub table_header: String,
    pub table_border: String,
    pub modal_border: String,
    pub modal_border_active: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            data: DataConfig::default(),
            display: DisplayConfig::default(),
            chart: ChartConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            logging: LoggingConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("gva_aggregate_data_2016.csv"),
            delimiter: None,
            infer_schema_length: None,
            compression: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_grouping: Grouping::default().label().to_string(),
            default_indexed: false,
            default_view: "chart".to_string(),
            show_preamble: true,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        let export = ChartExportOptions::default();
        Self {
            show_legend: export.show_legend,
            show_markers: export.show_markers,
            export_width: export.width,
            export_height: export.height,
            export_dir: PathBuf::from("."),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: "auto".to_string(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            secondary: "yellow".to_string(),
            error: "red".to_string(),
            dimmed: "dark_gray".to_string(),
            controls_bg: "indexed(236)".to_string(),
            header_bg: "black".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            table_header: "white".to_string(),
            table_border: "cyan".to_string(),
            modal_border: "cyan".to_string(),
            modal_border_active: "yellow".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        ConfigManager::new(app_name)?.load_config()
    }

    /// Parse a single config file (no defaults merged, no validation).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre!("Failed to read config file at {}: {}", path.display(), e))?;

        toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file at {}: {}", path.display(), e))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.data.merge(other.data);
        self.display.merge(other.display);
        self.chart.merge(other.chart);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.logging.merge(other.logging);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        self.display
            .default_grouping
            .parse::<Grouping>()
            .map_err(|e| eyre!("Invalid default_grouping: {}", e))?;

        ViewMode::from_name(&self.display.default_view).ok_or_else(|| {
            eyre!(
                "Invalid default_view: {}. Must be 'chart' or 'table'",
                self.display.default_view
            )
        })?;

        if let Some(name) = &self.data.compression {
            CompressionFormat::from_name(name).ok_or_else(|| {
                eyre!(
                    "Invalid compression: {}. Must be 'gzip', 'zstd', 'bzip2' or 'xz'",
                    name
                )
            })?;
        }

        if self.chart.export_width == 0 || self.chart.export_height == 0 {
            return Err(eyre!("export_width and export_height must be greater than 0"));
        }

        match self.theme.color_mode.as_str() {
            "light" | "dark" | "auto" => {}
            _ => {
                return Err(eyre!(
                    "Invalid color_mode: {}. Must be 'light', 'dark', or 'auto'",
                    self.theme.color_mode
                ))
            }
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }

    /// Starting breakdown. Falls back to the default when the name is invalid.
    pub fn default_grouping(&self) -> Grouping {
        self.display.default_grouping.parse().unwrap_or_default()
    }

    pub fn default_view(&self) -> ViewMode {
        ViewMode::from_name(&self.display.default_view).unwrap_or_default()
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.data.delimiter,
            infer_schema_length: self.data.infer_schema_length,
            compression: self
                .data
                .compression
                .as_deref()
                .and_then(CompressionFormat::from_name),
        }
    }

    pub fn export_options(&self) -> ChartExportOptions {
        ChartExportOptions {
            width: self.chart.export_width,
            height: self.chart.export_height,
            show_markers: self.chart.show_markers,
            show_legend: self.chart.show_legend,
        }
    }
}

impl AppConfig {
    /// Apply command-line overrides (CLI takes precedence over the config file)
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(path) = &args.path {
            self.data.path = path.clone();
        }
        if let Some(delimiter) = args.delimiter {
            self.data.delimiter = Some(delimiter);
        }
        if let Some(n) = args.infer_schema_length {
            self.data.infer_schema_length = Some(n);
        }
        if let Some(compression) = args.compression {
            self.data.compression = Some(compression.extension().to_string());
        }
        if let Some(grouping) = &args.grouping {
            self.display.default_grouping = grouping.clone();
        }
        if args.indexed {
            self.display.default_indexed = true;
        }
        if args.debug {
            self.debug.enabled = true;
        }
        if let Some(level) = &args.log_level {
            self.logging.level = Some(level.clone());
        }
        if let Some(file) = &args.log_file {
            self.logging.file = Some(file.clone());
        }
    }
}

/// Main area content: line chart or the matrix as a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Chart,
    Table,
}

impl ViewMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "chart" => Some(Self::Chart),
            "table" => Some(Self::Table),
            _ => None,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Chart => Self::Table,
            Self::Table => Self::Chart,
        }
    }
}

// Merge implementations for each config section
impl DataConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DataConfig::default();
        if other.path != default.path {
            self.path = other.path;
        }
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.infer_schema_length.is_some() {
            self.infer_schema_length = other.infer_schema_length;
        }
        if other.compression.is_some() {
            self.compression = other.compression;
        }
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.default_grouping != default.default_grouping {
            self.default_grouping = other.default_grouping;
        }
        if other.default_indexed != default.default_indexed {
            self.default_indexed = other.default_indexed;
        }
        if other.default_view != default.default_view {
            self.default_view = other.default_view;
        }
        if other.show_preamble != default.show_preamble {
            self.show_preamble = other.show_preamble;
        }
    }
}

impl ChartConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChartConfig::default();
        if other.show_legend != default.show_legend {
            self.show_legend = other.show_legend;
        }
        if other.show_markers != default.show_markers {
            self.show_markers = other.show_markers;
        }
        if other.export_width != default.export_width {
            self.export_width = other.export_width;
        }
        if other.export_height != default.export_height {
            self.export_height = other.export_height;
        }
        if other.export_dir != default.export_dir {
            self.export_dir = other.export_dir;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.color_mode != default.color_mode {
            self.color_mode = other.color_mode;
        }
        self.colors.merge(other.colors);
    }
}

macro_rules! color_fields {
    ($mac:ident) => {
        $mac!(primary);
        $mac!(secondary);
        $mac!(error);
        $mac!(dimmed);
        $mac!(controls_bg);
        $mac!(header_bg);
        $mac!(text_primary);
        $mac!(text_secondary);
        $mac!(table_header);
        $mac!(table_border);
        $mac!(modal_border);
        $mac!(modal_border_active);
    };
}

impl ColorConfig {
    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        macro_rules! validate_color {
            ($field:ident) => {
                parser.parse(&self.$field).map_err(|e| {
                    eyre!("Invalid color value for '{}': {}", stringify!($field), e)
                })?;
            };
        }
        color_fields!(validate_color);
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        macro_rules! merge_color {
            ($field:ident) => {
                if other.$field != default.$field {
                    self.$field = other.$field.clone();
                }
            };
        }
        color_fields!(merge_color);
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        if other.level.is_some() {
            self.level = other.level;
        }
        if other.file.is_some() {
            self.file = other.file;
        }
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        if other.enabled {
            self.enabled = true;
        }
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parse a color string (hex or named) and convert to appropriate terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        let trimmed = s.trim();

        // Hex format: "#ff0000" or "#FF0000" (6-character hex)
        if trimmed.starts_with('#') && trimmed.len() == 7 {
            let (r, g, b) = parse_hex(trimmed)?;
            if self.no_color {
                return Ok(Color::Reset);
            }
            return Ok(self.rgb(r, g, b));
        }

        // Indexed colors: "indexed(236)" for explicit 256-color palette
        if trimmed.to_lowercase().starts_with("indexed(") && trimmed.ends_with(')') {
            let num_str = &trimmed[8..trimmed.len() - 1];
            let num = num_str.parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            if self.no_color {
                return Ok(Color::Reset);
            }
            return Ok(Color::Indexed(num));
        }

        let color = match trimmed.to_lowercase().as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            "gray" | "grey" | "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => {
                Color::Indexed(8)
            }
            "light_gray" | "light gray" | "light_grey" | "light grey" => Color::Indexed(7),
            "reset" => Color::Reset,
            _ => {
                return Err(eyre!(
                    "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                     gray variants, indexed(n), or hex colors (#ff0000)",
                    trimmed
                ))
            }
        };
        if self.no_color {
            return Ok(Color::Reset);
        }
        Ok(color)
    }

    /// RGB to the best color the terminal supports
    pub fn rgb(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.starts_with('#') || s.len() != 7 {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok((r, g, b))
}

/// Convert RGB to nearest 256-color palette index (xterm palette)
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        // Map to grayscale ramp (232-255)
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        if gray < 8 {
            return 16;
        } else if gray > 247 {
            return 231;
        } else {
            return 232 + ((gray - 8) * 24 / 240) as u8;
        }
    }

    // Map to 6x6x6 color cube (16-231)
    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Convert RGB to nearest basic ANSI color (8 colors)
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
    /// Chart line colors, parallel to the export palette.
    pub series: Vec<Color>,
}

impl ColorConfig {
    /// Defaults for terminals with a light background
    pub fn light() -> Self {
        Self {
            controls_bg: "indexed(254)".to_string(),
            header_bg: "white".to_string(),
            text_primary: "black".to_string(),
            table_header: "black".to_string(),
            ..Self::default()
        }
    }
}

impl ThemeConfig {
    /// Colors with `color_mode` applied. In light mode every field still at its
    /// dark default takes the light default; explicit user colors are kept.
    /// "auto" uses the dark palette.
    pub fn resolved_colors(&self) -> ColorConfig {
        let mut colors = self.colors.clone();
        if self.color_mode == "light" {
            let dark = ColorConfig::default();
            let light = ColorConfig::light();
            macro_rules! lighten {
                ($field:ident) => {
                    if colors.$field == dark.$field {
                        colors.$field = light.$field;
                    }
                };
            }
            color_fields!(lighten);
        }
        colors
    }
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let resolved = config.resolved_colors();
        let mut colors = HashMap::new();

        macro_rules! insert_color {
            ($field:ident) => {
                colors.insert(
                    stringify!($field).to_string(),
                    parser.parse(&resolved.$field)?,
                );
            };
        }
        color_fields!(insert_color);

        let series = crate::chart_export::SERIES_PALETTE
            .iter()
            .map(|&(r, g, b)| parser.rgb(r, g, b))
            .collect();

        Ok(Self { colors, series })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    /// Line color for the series at `idx`
    pub fn series_color(&self, idx: usize) -> Color {
        if self.series.is_empty() {
            return Color::Reset;
        }
        self.series[idx % self.series.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        // Default colors always parse; fall back to an empty map just in case.
        Self::from_config(&ThemeConfig::default()).unwrap_or_else(|_| Self {
            colors: HashMap::new(),
            series: Vec::new(),
        })
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
