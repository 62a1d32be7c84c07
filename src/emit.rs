//! Format emitters: render a command list as displayable text.
//!
//! Three targets share one building block, the JSON state update posted to
//! the controller's `/json/state` endpoint:
//!
//! ```text
//! {"on":true,"bri":128,"seg":{"id":0,"i":[0,4,"ff0000"]}}
//! ```
//!
//! - **native**: the updates themselves, separated by a note that the
//!   controller only takes one at a time
//! - **shell**: one `curl` per update, chained with `&&`
//! - **home-assistant**: the shell chain inside a `command_line` switch
//!
//! ## Rust concepts
//! - `#[derive(Serialize)]` on borrowed structs to build JSON without string pasting
//! - `#[serde(untagged)]` to mix numbers, strings and arrays in one JSON array

use crate::batch::{Command, Entry};
use crate::config::{ColorEncoding, CompileConfig, OutputFormat};
use crate::Color;
use serde::Serialize;

/// Separator between native commands in the combined output.
pub const NATIVE_SEPARATOR: &str =
    "\n<NEXT COMMAND (multiple commands not supported in API/preset setup)>\n";

/// Separator between shell commands: later ones only run if earlier ones succeed.
pub const SHELL_SEPARATOR: &str = " && ";

// ── JSON state update ────────────────────────────────────────────────

/// One value inside the flat `i` array.
#[derive(Serialize)]
#[serde(untagged)]
enum Token {
    Index(usize),
    Hex(String),
    Rgb([u8; 3]),
}

fn color_token(color: Color, encoding: ColorEncoding) -> Token {
    match encoding {
        ColorEncoding::Hex => Token::Hex(color.to_hex()),
        ColorEncoding::Decimal => Token::Rgb(color.to_array()),
    }
}

fn entry_tokens(entry: &Entry, encoding: ColorEncoding) -> Vec<Token> {
    let color = color_token(entry.color(), encoding);
    match *entry {
        Entry::Color(_) => vec![color],
        Entry::Indexed { index, .. } => vec![Token::Index(index), color],
        Entry::Range { start, stop, .. } => vec![Token::Index(start), Token::Index(stop), color],
    }
}

#[derive(Serialize)]
struct SegmentUpdate {
    id: u8,
    i: Vec<Token>,
}

#[derive(Serialize)]
struct StateUpdate {
    on: bool,
    bri: u8,
    seg: SegmentUpdate,
}

#[derive(Serialize)]
struct PowerOff {
    on: bool,
}

/// Compact JSON for a serializable payload.
///
/// The payload types here are plain structs of numbers and strings, which
/// `serde_json` always serializes; an empty object stands in if it ever
/// reports otherwise.
fn to_json<T: Serialize>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize state update: {}", e);
        "{}".to_string()
    })
}

/// The JSON state update for a single command.
pub fn state_update(command: &Command, config: &CompileConfig) -> String {
    let update = StateUpdate {
        on: true,
        bri: config.brightness,
        seg: SegmentUpdate {
            id: config.segment_id,
            i: command
                .entries
                .iter()
                .flat_map(|entry| entry_tokens(entry, config.color_encoding))
                .collect(),
        },
    };
    to_json(&update)
}

// ── Shell ────────────────────────────────────────────────────────────

/// Base URL of the controller: `http://` is added unless a scheme is present.
pub fn base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// A `curl` posting `payload` to the controller's state endpoint.
pub fn curl(host: &str, payload: &str) -> String {
    format!(
        "curl -X POST \"{}/json/state\" -d '{}' -H \"Content-Type: application/json\"",
        base_url(host),
        payload
    )
}

// ── Formats ──────────────────────────────────────────────────────────

/// Native JSON updates, one per command.
pub fn native(commands: &[Command], config: &CompileConfig) -> String {
    commands
        .iter()
        .map(|command| state_update(command, config))
        .collect::<Vec<_>>()
        .join(NATIVE_SEPARATOR)
}

/// `curl` invocations chained so execution stops at the first failure.
pub fn shell(commands: &[Command], config: &CompileConfig) -> String {
    commands
        .iter()
        .map(|command| curl(&config.host, &state_update(command, config)))
        .collect::<Vec<_>>()
        .join(SHELL_SEPARATOR)
}

/// A Home Assistant `command_line` switch that shows the image when turned on.
pub fn home_assistant(commands: &[Command], config: &CompileConfig) -> String {
    let command_off = curl(&config.host, &to_json(&PowerOff { on: false }));
    format!(
        "#Uncomment if you don't already have these defined in your switch section of your configuration.yaml
#- platform: command_line
  #switches:
    {entity_id}:
      friendly_name: {friendly_name}
      unique_id: {unique_id}
      command_on: >
        {command_on}
      command_off: >
        {command_off}",
        entity_id = config.ha_entity_id,
        friendly_name = config.ha_friendly_name,
        unique_id = config.ha_unique_id,
        command_on = shell(commands, config),
    )
}

/// Text shown instead of output when the format selector is not recognized.
pub fn unknown_format(selector: &str) -> String {
    format!("ERROR!\n{selector} is an unknown format.")
}

/// Render `commands` in the configured format.
///
/// Never fails: an unknown format yields an error message as the text.
pub fn render(commands: &[Command], config: &CompileConfig) -> String {
    match &config.format {
        OutputFormat::Native => native(commands, config),
        OutputFormat::Shell => shell(commands, config),
        OutputFormat::HomeAssistant => home_assistant(commands, config),
        OutputFormat::Unknown(selector) => {
            tracing::warn!("Unknown output format: {}", selector);
            unknown_format(selector)
        }
    }
}
