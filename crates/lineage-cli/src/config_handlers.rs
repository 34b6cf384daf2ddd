//! Handlers for the `config` subcommands (`path`, `get`, `set`, `init`, `show`).
//!
//! Dotted keys address nested tables, e.g. `layout.miniature.center_x`.
//! Output goes to the supplied writer so handlers stay testable.

use crate::cli::ConfigAction;
use crate::config::{LineageConfig, parse_failure};
use lineage::{Error, Result};
use std::io::Write;
use std::path::PathBuf;

// ============================================================================
// Command dispatch
// ============================================================================

/// Runs a config subcommand.
pub fn handle_config_command(
    config_path: Option<&str>,
    action: ConfigAction,
    out: &mut dyn Write,
) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path, out),
        ConfigAction::Get { key } => cmd_config_get(config_path, &key, out),
        ConfigAction::Set { key, value } => cmd_config_set(config_path, &key, &value, out),
        ConfigAction::Init { file, force } => {
            cmd_config_init(file.as_deref().or(config_path), force, out)
        }
        ConfigAction::Show => cmd_config_show(config_path, out),
    }
}

fn resolved_path(config_path: Option<&str>) -> Result<PathBuf> {
    LineageConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))
}

fn emit(out: &mut dyn Write, line: impl std::fmt::Display) -> Result<()> {
    writeln!(out, "{line}").map_err(Error::from)
}

// ============================================================================
// Command handlers
// ============================================================================

/// Prints the resolved config file path.
pub fn cmd_config_path(config_path: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let path = resolved_path(config_path)?;
    emit(out, path.display())?;
    if !path.exists() {
        log::info!("config file does not exist yet; `lineage config init` creates it");
    }
    Ok(())
}

/// Prints the effective value at a dotted key.
pub fn cmd_config_get(config_path: Option<&str>, key: &str, out: &mut dyn Write) -> Result<()> {
    let config = LineageConfig::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    let found = lookup(&value, key)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))?;
    emit(out, render(found))
}

/// Writes a value at a dotted key into an existing config file.
pub fn cmd_config_set(
    config_path: Option<&str>,
    key: &str,
    raw: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let path = resolved_path(config_path)?;
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `lineage config init` first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_failure(&path, e))?;
    let segments: Vec<&str> = key.split('.').collect();
    assign(&mut table, &segments, infer_value(raw))?;

    // Reject edits that would make the file unloadable.
    let updated = toml::to_string_pretty(&table).map_err(|e| Error::config(e.to_string()))?;
    toml::from_str::<LineageConfig>(&updated)
        .map_err(|e| Error::config(format!("'{key} = {raw}' is not a valid setting: {e}")))?;

    std::fs::write(&path, updated).map_err(|e| Error::io_with_path(e, &path))?;
    emit(out, format_args!("Set {key} = {raw} in {}", path.display()))
}

/// Writes a default config file.
pub fn cmd_config_init(file: Option<&str>, force: bool, out: &mut dyn Write) -> Result<()> {
    let path = resolved_path(file)?;
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let text = LineageConfig::default().to_toml_string()?;
    std::fs::write(&path, text).map_err(|e| Error::io_with_path(e, &path))?;
    emit(out, format_args!("Config file created at {}", path.display()))
}

/// Prints the effective configuration as TOML.
pub fn cmd_config_show(config_path: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let text = LineageConfig::load(config_path)?.to_toml_string()?;
    write!(out, "{text}").map_err(Error::from)
}

// ============================================================================
// Dotted-key helpers
// ============================================================================

/// Value at a dotted key.
pub fn lookup<'a>(root: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.').try_fold(root, |node, segment| node.get(segment))
}

/// Stores `value` at `segments`, creating intermediate tables.
pub fn assign(table: &mut toml::Table, segments: &[&str], value: toml::Value) -> Result<()> {
    match segments {
        [] => Err(Error::config("Empty key path")),
        [last] => {
            table.insert((*last).to_string(), value);
            Ok(())
        }
        [head, rest @ ..] => {
            let child = table
                .entry((*head).to_string())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            match child {
                toml::Value::Table(inner) => assign(inner, rest, value),
                _ => Err(Error::config(format!("'{head}' is not a table"))),
            }
        }
    }
}

/// Reads a command-line string as the most specific TOML scalar.
pub fn infer_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        toml::Value::Float(f)
    } else {
        toml::Value::String(raw.to_string())
    }
}

/// Display form of a TOML value: bare scalars, pretty tables.
pub fn render(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Table(_) | toml::Value::Array(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
