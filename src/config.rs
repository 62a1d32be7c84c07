//! Compile configuration: one explicit, immutable value per compile.
//!
//! The same struct is filled from CLI flags (`clap::Args`), from an HTTP
//! query string or JSON body (`serde::Deserialize`), and documented in the
//! OpenAPI schema (`utoipa::ToSchema`). Every field has a default, so a
//! request only needs to name what it changes.
//!
//! ## Rust concepts
//! - Several derive macros stacked on one struct
//! - `#[serde(default)]` to fall back to `Default` for missing fields
//! - `FromStr` with `Infallible` for a parse that can never fail

use clap::{Args, ValueEnum};
use serde::{Deserialize, Deserializer, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_ENTRIES: usize = 256;
pub const DEFAULT_BRIGHTNESS: u8 = 128;
pub const DEFAULT_SEGMENT_ID: u8 = 0;
pub const DEFAULT_HOST: &str = "192.168.4.1";
pub const DEFAULT_HA_ENTITY_ID: &str = "wled_pixel_art";
pub const DEFAULT_HA_FRIENDLY_NAME: &str = "WLED Pixel Art";
pub const DEFAULT_HA_UNIQUE_ID: &str = "wled_pixel_art_switch";

/// Largest requested grid the HTTP API will sample to (a 512x512 matrix).
pub const MAX_REQUESTED_CELLS: usize = 512 * 512;

// ── Selectors ────────────────────────────────────────────────────────

/// How the LEDs of the matrix are physically chained together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Wiring {
    /// Every row starts on the left
    #[default]
    Matrix,
    /// Serpentine, first row runs left to right
    #[serde(alias = "l2r")]
    #[value(alias = "l2r")]
    ZigzagForward,
    /// Serpentine, first row runs right to left
    #[serde(alias = "r2l")]
    #[value(alias = "r2l")]
    ZigzagReverse,
}

/// How each color entry states which LEDs it covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Addressing {
    /// One color per LED, positions implied
    Single,
    /// `start, stop, color` for every run
    Range,
    /// Ranges for runs, bare colors for one-LED runs
    #[default]
    Hybrid,
}

/// How a color is written inside an entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ColorEncoding {
    /// `"ff0000"`
    #[default]
    Hex,
    /// `[255,0,0]`
    #[serde(alias = "dec")]
    #[value(alias = "dec")]
    Decimal,
}

/// Which entries carry an explicit start index when positions are implied.
///
/// The controller restarts its implicit position at LED 0 for every
/// request, so anchoring each command is what keeps multi-command output
/// landing on the right LEDs. `FirstCommand` anchors only the very first
/// entry of the whole output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum IndexAnchor {
    #[default]
    EachCommand,
    FirstCommand,
}

/// Output text format.
///
/// Parsing never fails: an unrecognized selector is kept as `Unknown` so
/// the emitter can report it as displayable text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputFormat {
    /// JSON state updates for the controller's `/json/state` endpoint
    #[default]
    Native,
    /// `curl` invocations chained with `&&`
    Shell,
    /// A Home Assistant `command_line` switch
    HomeAssistant,
    Unknown(String),
}

impl OutputFormat {
    pub fn parse(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "native" | "wled" | "json" => Self::Native,
            "shell" | "curl" => Self::Shell,
            "home-assistant" | "homeassistant" | "ha" => Self::HomeAssistant,
            _ => Self::Unknown(selector.to_string()),
        }
    }
}

impl From<String> for OutputFormat {
    fn from(selector: String) -> Self {
        Self::parse(&selector)
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.to_string()
    }
}

impl FromStr for OutputFormat {
    type Err = Infallible;

    fn from_str(selector: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(selector))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Shell => f.write_str("shell"),
            Self::HomeAssistant => f.write_str("home-assistant"),
            Self::Unknown(selector) => f.write_str(selector),
        }
    }
}

// ── CompileConfig ────────────────────────────────────────────────────

/// Everything a compile needs besides the image itself.
#[derive(Clone, Debug, PartialEq, Eq, Args, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct CompileConfig {
    /// Target grid width in LEDs (used only with `scale`)
    #[arg(long)]
    #[serde(deserialize_with = "lenient_dimension")]
    #[schema(example = 16)]
    pub width: Option<u32>,

    /// Target grid height in LEDs (used only with `scale`)
    #[arg(long)]
    #[serde(deserialize_with = "lenient_dimension")]
    #[schema(example = 16)]
    pub height: Option<u32>,

    /// Resample to width x height instead of the image's natural size
    #[arg(long)]
    pub scale: bool,

    /// Physical wiring of the matrix
    #[arg(long, value_enum, default_value_t = Wiring::Matrix)]
    pub wiring: Wiring,

    /// How entries address LEDs
    #[arg(long, value_enum, default_value_t = Addressing::Hybrid)]
    pub addressing: Addressing,

    /// How colors are written
    #[arg(long, value_enum, default_value_t = ColorEncoding::Hex)]
    pub color_encoding: ColorEncoding,

    /// Maximum color entries per command (0 means the default)
    #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES)]
    #[schema(example = 256)]
    pub max_entries: usize,

    /// Which entries carry an explicit start index
    #[arg(long, value_enum, default_value_t = IndexAnchor::EachCommand)]
    pub anchor: IndexAnchor,

    /// Output format: native, shell or home-assistant
    #[arg(long, default_value = "native")]
    #[schema(value_type = String, example = "native")]
    pub format: OutputFormat,

    /// Controller host or URL written into shell and Home Assistant output
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Brightness sent with every command (0-255)
    #[arg(long, default_value_t = DEFAULT_BRIGHTNESS)]
    #[schema(example = 128)]
    pub brightness: u8,

    /// Controller segment the colors are written to
    #[arg(long, default_value_t = DEFAULT_SEGMENT_ID)]
    pub segment_id: u8,

    /// Home Assistant switch entity id
    #[arg(long, default_value = DEFAULT_HA_ENTITY_ID)]
    pub ha_entity_id: String,

    /// Home Assistant friendly name
    #[arg(long, default_value = DEFAULT_HA_FRIENDLY_NAME)]
    pub ha_friendly_name: String,

    /// Home Assistant unique id
    #[arg(long, default_value = DEFAULT_HA_UNIQUE_ID)]
    pub ha_unique_id: String,
}

/// Read a grid dimension without ever failing the request.
///
/// Query strings deliver text and JSON bodies deliver numbers. Anything that
/// is not a number of at least 1 becomes `None`, so the compile falls back to
/// the image's natural size. Fractions are truncated.
fn lenient_dimension<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let dimension = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(dimension
        .filter(|d| d.is_finite() && *d >= 1.0 && *d <= f64::from(u32::MAX))
        .map(|d| d as u32))
}

impl CompileConfig {
    /// The requested grid, if resampling is enabled and both sides are usable.
    pub fn requested_size(&self) -> Option<crate::GridSize> {
        if !self.scale {
            return None;
        }
        match (self.width, self.height) {
            (Some(width), Some(height)) if width >= 1 && height >= 1 => {
                Some(crate::GridSize::new(width, height))
            }
            _ => None,
        }
    }

    /// Entry cap per command, with an unusable `0` replaced by the default.
    pub fn effective_max_entries(&self) -> usize {
        if self.max_entries == 0 {
            DEFAULT_MAX_ENTRIES
        } else {
            self.max_entries
        }
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            scale: false,
            wiring: Wiring::default(),
            addressing: Addressing::default(),
            color_encoding: ColorEncoding::default(),
            max_entries: DEFAULT_MAX_ENTRIES,
            anchor: IndexAnchor::default(),
            format: OutputFormat::default(),
            host: DEFAULT_HOST.to_string(),
            brightness: DEFAULT_BRIGHTNESS,
            segment_id: DEFAULT_SEGMENT_ID,
            ha_entity_id: DEFAULT_HA_ENTITY_ID.to_string(),
            ha_friendly_name: DEFAULT_HA_FRIENDLY_NAME.to_string(),
            ha_unique_id: DEFAULT_HA_UNIQUE_ID.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridSize;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: CompileConfig,
    }

    #[rstest]
    #[case("native", OutputFormat::Native)]
    #[case("wled", OutputFormat::Native)]
    #[case("JSON", OutputFormat::Native)]
    #[case("curl", OutputFormat::Shell)]
    #[case("shell", OutputFormat::Shell)]
    #[case("ha", OutputFormat::HomeAssistant)]
    #[case("home-assistant", OutputFormat::HomeAssistant)]
    #[case("xml", OutputFormat::Unknown("xml".to_string()))]
    fn test_output_format_parse(#[case] selector: &str, #[case] expected: OutputFormat) {
        assert_eq!(OutputFormat::parse(selector), expected);
    }

    #[test]
    fn unknown_format_displays_its_selector() {
        assert_eq!(OutputFormat::parse("yaml2").to_string(), "yaml2");
    }

    #[test]
    fn requested_size_needs_scale_marker() {
        let config = CompileConfig {
            width: Some(8),
            height: Some(8),
            ..CompileConfig::default()
        };
        assert_eq!(config.requested_size(), None);

        let scaled = CompileConfig {
            scale: true,
            ..config
        };
        assert_eq!(scaled.requested_size(), Some(GridSize::new(8, 8)));
    }

    #[rstest]
    #[case(None, Some(8))]
    #[case(Some(8), None)]
    #[case(Some(0), Some(8))]
    #[case(Some(8), Some(0))]
    fn requested_size_rejects_missing_or_zero(
        #[case] width: Option<u32>,
        #[case] height: Option<u32>,
    ) {
        let config = CompileConfig {
            width,
            height,
            scale: true,
            ..CompileConfig::default()
        };
        assert_eq!(config.requested_size(), None);
    }

    #[rstest]
    #[case(0, DEFAULT_MAX_ENTRIES)]
    #[case(1, 1)]
    #[case(50, 50)]
    fn test_effective_max_entries(#[case] configured: usize, #[case] expected: usize) {
        let config = CompileConfig {
            max_entries: configured,
            ..CompileConfig::default()
        };
        assert_eq!(config.effective_max_entries(), expected);
    }

    #[test]
    fn json_body_fills_missing_fields_from_defaults() {
        let config: CompileConfig = serde_json::from_str(
            r#"{"wiring":"l2r","addressing":"range","color_encoding":"dec","format":"curl","max_entries":10}"#,
        )
        .unwrap();

        assert_eq!(config.wiring, Wiring::ZigzagForward);
        assert_eq!(config.addressing, Addressing::Range);
        assert_eq!(config.color_encoding, ColorEncoding::Decimal);
        assert_eq!(config.format, OutputFormat::Shell);
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.brightness, DEFAULT_BRIGHTNESS);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn json_body_keeps_unknown_format() {
        let config: CompileConfig = serde_json::from_str(r#"{"format":"svg"}"#).unwrap();
        assert_eq!(config.format, OutputFormat::Unknown("svg".to_string()));
    }

    #[rstest]
    #[case(r#"{"width":-4,"height":4}"#)]
    #[case(r#"{"width":"abc","height":4}"#)]
    #[case(r#"{"width":"","height":4}"#)]
    #[case(r#"{"width":null,"height":4}"#)]
    #[case(r#"{"width":0.5,"height":4}"#)]
    fn unusable_json_width_becomes_none(#[case] body: &str) {
        let config: CompileConfig = serde_json::from_str(body).unwrap();
        assert_eq!(config.width, None);
        assert_eq!(config.height, Some(4));
    }

    #[rstest]
    #[case(r#"{"width":"12"}"#, Some(12))]
    #[case(r#"{"width":" 12 "}"#, Some(12))]
    #[case(r#"{"width":12.9}"#, Some(12))]
    #[case(r#"{"width":1}"#, Some(1))]
    fn usable_json_width_is_kept(#[case] body: &str, #[case] expected: Option<u32>) {
        let config: CompileConfig = serde_json::from_str(body).unwrap();
        assert_eq!(config.width, expected);
    }

    #[test]
    fn output_format_serializes_as_its_selector() {
        assert_eq!(
            serde_json::to_value(OutputFormat::HomeAssistant).unwrap(),
            serde_json::json!("home-assistant")
        );
        assert_eq!(
            serde_json::to_value(OutputFormat::Unknown("svg".to_string())).unwrap(),
            serde_json::json!("svg")
        );
        assert_eq!(
            serde_json::to_value(Wiring::ZigzagForward).unwrap(),
            serde_json::json!("zigzag-forward")
        );
    }

    #[test]
    fn cli_defaults_match_default_impl() {
        let cli = Cli::try_parse_from(["led-pixart-rs"]).unwrap();
        assert_eq!(cli.config, CompileConfig::default());
    }

    #[test]
    fn cli_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "led-pixart-rs",
            "--width",
            "32",
            "--height",
            "8",
            "--scale",
            "--wiring",
            "r2l",
            "--addressing",
            "single",
            "--format",
            "ha",
            "--brightness",
            "255",
        ])
        .unwrap();

        assert_eq!(cli.config.requested_size(), Some(GridSize::new(32, 8)));
        assert_eq!(cli.config.wiring, Wiring::ZigzagReverse);
        assert_eq!(cli.config.addressing, Addressing::Single);
        assert_eq!(cli.config.format, OutputFormat::HomeAssistant);
        assert_eq!(cli.config.brightness, 255);
    }
}
