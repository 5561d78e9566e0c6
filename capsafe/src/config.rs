#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use capsafe_core::{HonoraryTable, MarkerRegistry, Policy};
use capsafe_model::{MarkerSet, MarkerTrait};
use miette::Diagnostic;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "capsafe.toml";

#[derive(Debug, Error, Diagnostic)]
#[error("config error: {message}")]
#[diagnostic(code(capsafe::config))]
pub struct ConfigError {
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub config_path: Option<PathBuf>,
    pub registry: MarkerRegistry,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    policy: PolicySection,

    #[serde(default)]
    honorary: Vec<HonoraryEntry>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicySection {
    #[serde(default)]
    identity_root: Option<String>,

    #[serde(default)]
    enum_base: Option<String>,

    #[serde(default)]
    reserved_namespace: Option<String>,

    #[serde(default)]
    static_field_trait: Option<String>,

    /// Start from an empty honorary table instead of the library defaults.
    #[serde(default)]
    replace_builtin_honoraries: bool,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct HonoraryEntry {
    #[serde(rename = "type")]
    type_name: String,

    traits: Vec<String>,
}

/// Walk up from `start` looking for `capsafe.toml`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut cur = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let candidate = cur.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        match cur.parent() {
            Some(p) if !p.as_os_str().is_empty() => cur = p.to_path_buf(),
            _ => return None,
        }
    }
}

/// An explicit path must exist; otherwise search upward from `start` and fall
/// back to the defaults.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> Result<ResolvedConfig, ConfigError> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(start),
    };
    let Some(path) = path else {
        tracing::debug!("no {CONFIG_FILE_NAME} found; using defaults");
        return Ok(ResolvedConfig {
            config_path: None,
            registry: MarkerRegistry::default(),
        });
    };

    let raw = fs::read_to_string(&path).map_err(|e| ConfigError {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    let registry = parse_config(&raw).map_err(|e| ConfigError {
        message: format!("{}: {}", path.display(), e.message),
    })?;
    tracing::info!(path = %path.display(), "loaded config");
    Ok(ResolvedConfig {
        config_path: Some(path),
        registry,
    })
}

pub fn parse_config(raw: &str) -> Result<MarkerRegistry, ConfigError> {
    let parsed: ConfigFile = toml::from_str(raw).map_err(|e| ConfigError {
        message: format!("failed to parse: {e}"),
    })?;

    let mut policy = Policy::default();
    let section = parsed.policy;
    if let Some(root) = section.identity_root {
        policy.identity_root = root;
    }
    if let Some(base) = section.enum_base {
        policy.enum_base = base;
    }
    if let Some(ns) = section.reserved_namespace {
        policy.reserved_namespace = ns.trim_end_matches('.').to_string();
    }
    if let Some(t) = section.static_field_trait {
        policy.static_field_trait = Some(parse_marker(&t)?);
    }

    let mut honoraries = if section.replace_builtin_honoraries {
        HonoraryTable::empty()
    } else {
        HonoraryTable::builtin()
    };
    for entry in parsed.honorary {
        let traits = entry
            .traits
            .iter()
            .map(|t| parse_marker(t))
            .collect::<Result<MarkerSet, _>>()?;
        honoraries.grant(entry.type_name, traits);
    }

    Ok(MarkerRegistry::new(honoraries, policy))
}

fn parse_marker(name: &str) -> Result<MarkerTrait, ConfigError> {
    name.parse::<MarkerTrait>().map_err(|e| ConfigError {
        message: e.to_string(),
    })
}
