//! Configuration file loading with precedence handling.

use crate::model::{FontConfig, Padding};
use crate::view_state::EngineSettings;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CHAPTERFLOW_CONFIG";

/// Environment variable overriding the body font size.
pub const FONT_SIZE_ENV: &str = "CHAPTERFLOW_FONT_SIZE";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown fields.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// An environment override holds a value that cannot be parsed.
    #[error("Invalid value {value:?} for {name}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/chapterflow/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Font section.
    #[serde(default)]
    pub font: Option<FontSection>,

    /// Horizontal padding in pixels.
    #[serde(default)]
    pub padding_x: Option<f32>,

    /// Vertical padding in pixels.
    #[serde(default)]
    pub padding_y: Option<f32>,

    /// Body lines swallowed at chapter crossings in paginated mode.
    #[serde(default)]
    pub preserve_overlap_lines: Option<f32>,

    /// Chapters kept loaded on each side of the visible window.
    #[serde(default)]
    pub lookahead_chapters: Option<usize>,

    /// Lead-in distance for current-chapter detection, in pixels.
    #[serde(default)]
    pub lead_in_px: Option<f32>,

    /// Navigation highlight duration in milliseconds.
    #[serde(default)]
    pub highlight_ms: Option<u64>,

    /// Smooth scroll duration in milliseconds.
    #[serde(default)]
    pub smooth_scroll_ms: Option<u64>,

    /// Text cache capacity in continuous mode.
    #[serde(default)]
    pub text_cache_continuous: Option<usize>,

    /// Text cache capacity in paginated mode.
    #[serde(default)]
    pub text_cache_paginated: Option<usize>,

    /// Layout cache capacity.
    #[serde(default)]
    pub layout_cache_capacity: Option<usize>,

    /// Character count assumed for chapters without one.
    #[serde(default)]
    pub fallback_chapter_chars: Option<usize>,

    /// Gap after each chapter in continuous mode, in pixels.
    #[serde(default)]
    pub chapter_gap: Option<f32>,

    /// Smallest zoom font size.
    #[serde(default)]
    pub min_font_size: Option<f32>,

    /// Largest zoom font size.
    #[serde(default)]
    pub max_font_size: Option<f32>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Path to the preference file.
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
}

/// Font section from TOML.
///
/// ```toml
/// [font]
/// family = "serif"
/// body_size = 18.0
/// line_height = 1.8
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FontSection {
    /// Font family.
    #[serde(default)]
    pub family: Option<String>,
    /// Body font size in pixels.
    #[serde(default)]
    pub body_size: Option<f32>,
    /// Body line height multiplier.
    #[serde(default)]
    pub line_height: Option<f32>,
    /// Title font size in pixels.
    #[serde(default)]
    pub title_size: Option<f32>,
    /// Title line height multiplier.
    #[serde(default)]
    pub title_line_height: Option<f32>,
    /// Space below titles in pixels.
    #[serde(default)]
    pub title_spacing: Option<f32>,
    /// Space between paragraphs in pixels.
    #[serde(default)]
    pub paragraph_spacing: Option<f32>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Font parameters.
    pub font: FontConfig,
    /// Horizontal padding.
    pub padding_x: f32,
    /// Vertical padding.
    pub padding_y: f32,
    /// Preserve overlap in body lines.
    pub preserve_overlap_lines: f32,
    /// Lookahead chapters.
    pub lookahead_chapters: usize,
    /// Lead-in distance.
    pub lead_in_px: f32,
    /// Highlight duration in milliseconds.
    pub highlight_ms: u64,
    /// Smooth scroll duration in milliseconds.
    pub smooth_scroll_ms: u64,
    /// Continuous text cache capacity.
    pub text_cache_continuous: usize,
    /// Paginated text cache capacity.
    pub text_cache_paginated: usize,
    /// Layout cache capacity.
    pub layout_cache_capacity: usize,
    /// Fallback chapter length.
    pub fallback_chapter_chars: usize,
    /// Chapter gap.
    pub chapter_gap: f32,
    /// Minimum zoom font size.
    pub min_font_size: f32,
    /// Maximum zoom font size.
    pub max_font_size: f32,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
    /// Path to the preference file.
    pub preferences_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            font: FontConfig::default(),
            padding_x: engine.padding.horizontal,
            padding_y: engine.padding.vertical,
            preserve_overlap_lines: engine.preserve_overlap_lines,
            lookahead_chapters: engine.lookahead_chapters,
            lead_in_px: engine.lead_in_px,
            highlight_ms: duration_ms(engine.highlight),
            smooth_scroll_ms: duration_ms(engine.smooth_scroll),
            text_cache_continuous: engine.text_cache_continuous,
            text_cache_paginated: engine.text_cache_paginated,
            layout_cache_capacity: engine.layout_cache_capacity,
            fallback_chapter_chars: engine.fallback_chapter_chars,
            chapter_gap: engine.chapter_gap,
            min_font_size: engine.min_font_size,
            max_font_size: engine.max_font_size,
            log_file_path: default_log_path(),
            preferences_path: crate::preferences::default_preferences_path(),
        }
    }
}

impl ResolvedConfig {
    /// Font parameters to start a reader with.
    pub fn font_config(&self) -> FontConfig {
        self.font.clone()
    }

    /// Runtime knobs for the renderers.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            padding: Padding::new(self.padding_x, self.padding_y),
            preserve_overlap_lines: self.preserve_overlap_lines,
            lookahead_chapters: self.lookahead_chapters,
            lead_in_px: self.lead_in_px,
            highlight: Duration::from_millis(self.highlight_ms),
            smooth_scroll: Duration::from_millis(self.smooth_scroll_ms),
            text_cache_continuous: self.text_cache_continuous,
            text_cache_paginated: self.text_cache_paginated,
            layout_cache_capacity: self.layout_cache_capacity,
            fallback_chapter_chars: self.fallback_chapter_chars,
            chapter_gap: self.chapter_gap,
            min_font_size: self.min_font_size,
            max_font_size: self.max_font_size,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/chapterflow/chapterflow.log` on Unix-like systems,
/// or the platform equivalent. Falls back to the current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("chapterflow").join("chapterflow.log")
    } else {
        PathBuf::from("chapterflow.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/chapterflow/config.toml` on Unix, appropriate path elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chapterflow").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `CHAPTERFLOW_CONFIG` environment variable
/// 3. Default path `~/.config/chapterflow/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks `CHAPTERFLOW_FONT_SIZE` (body font size in pixels).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnv`] when the variable is set but not a positive
/// number.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
    if let Ok(value) = std::env::var(FONT_SIZE_ENV) {
        let size = value
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|size| size.is_finite() && *size > 0.0)
            .ok_or_else(|| ConfigError::InvalidEnv {
                name: FONT_SIZE_ENV,
                value: value.clone(),
            })?;
        config.font = config.font.with_body_size(size);
    }

    Ok(config)
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    let font_section = config.font.unwrap_or_default();
    let font_defaults = defaults.font.clone();
    let font = FontConfig {
        family: font_section.family.unwrap_or(font_defaults.family),
        body_size: font_section.body_size.unwrap_or(font_defaults.body_size),
        line_height: font_section.line_height.unwrap_or(font_defaults.line_height),
        title_size: font_section.title_size.unwrap_or(font_defaults.title_size),
        title_line_height: font_section
            .title_line_height
            .unwrap_or(font_defaults.title_line_height),
        title_spacing: font_section.title_spacing.unwrap_or(font_defaults.title_spacing),
        paragraph_spacing: font_section
            .paragraph_spacing
            .unwrap_or(font_defaults.paragraph_spacing),
    };

    ResolvedConfig {
        font,
        padding_x: config.padding_x.unwrap_or(defaults.padding_x),
        padding_y: config.padding_y.unwrap_or(defaults.padding_y),
        preserve_overlap_lines: config
            .preserve_overlap_lines
            .unwrap_or(defaults.preserve_overlap_lines),
        lookahead_chapters: config.lookahead_chapters.unwrap_or(defaults.lookahead_chapters),
        lead_in_px: config.lead_in_px.unwrap_or(defaults.lead_in_px),
        highlight_ms: config.highlight_ms.unwrap_or(defaults.highlight_ms),
        smooth_scroll_ms: config.smooth_scroll_ms.unwrap_or(defaults.smooth_scroll_ms),
        text_cache_continuous: config
            .text_cache_continuous
            .unwrap_or(defaults.text_cache_continuous),
        text_cache_paginated: config
            .text_cache_paginated
            .unwrap_or(defaults.text_cache_paginated),
        layout_cache_capacity: config
            .layout_cache_capacity
            .unwrap_or(defaults.layout_cache_capacity),
        fallback_chapter_chars: config
            .fallback_chapter_chars
            .unwrap_or(defaults.fallback_chapter_chars),
        chapter_gap: config.chapter_gap.unwrap_or(defaults.chapter_gap),
        min_font_size: config.min_font_size.unwrap_or(defaults.min_font_size),
        max_font_size: config.max_font_size.unwrap_or(defaults.max_font_size),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        preferences_path: config.preferences_path.unwrap_or(defaults.preferences_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: ResolvedConfig, font_size_override: Option<f32>) -> ResolvedConfig {
    if let Some(size) = font_size_override {
        config.font = config.font.with_body_size(size);
    }
    config
}

/// Run the whole precedence chain.
///
/// # Errors
///
/// Propagates file and environment errors from the individual steps.
pub fn resolve(
    config_path: Option<PathBuf>,
    font_size_override: Option<f32>,
) -> Result<ResolvedConfig, ConfigError> {
    let file = load_config_with_precedence(config_path)?;
    let config = apply_env_overrides(merge_config(file))?;
    Ok(apply_cli_overrides(config, font_size_override))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
