//! Loads a [`Policy`] from a configuration directory.
//!
//! # Design
//! - Layout: `trackers/*` (one tracker per file), `clients/<name>_*`, and
//!   optional `scoring` / `tags` documents at the root.
//! - Documents are YAML (`.yml`, `.yaml`) or JSON (`.json`), chosen by extension.
//! - Tracker files are read in file-name order; that order is the keyword
//!   matching precedence.
//! - The directory is read once per run; the resulting policy is immutable.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{ClientDocument, ScoringDocument, TagsDocument, TrackerDocument};
use crate::policy::{Policy, PolicyParts};
use crate::settings::RunSettings;

const TRACKERS_DIR: &str = "trackers";
const CLIENTS_DIR: &str = "clients";
const SCORING_STEMS: [&str; 2] = ["scoring", "scoring_config"];
const TAGS_STEMS: [&str; 2] = ["tags", "tags_config"];

/// Serialisation of one configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    const EXTENSIONS: [&'static str; 3] = ["yml", "yaml", "json"];

    fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(OsStr::to_str) {
            Some("json") => Some(Self::Json),
            Some("yml" | "yaml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Load and validate the policy stored under `dir`.
///
/// Run-level switches and the download folder come from `settings`.
///
/// # Errors
///
/// Returns an IO error when a directory or file cannot be read,
/// [`ConfigError::EmptyDirectory`] when no tracker or client document exists,
/// [`ConfigError::Document`] or [`ConfigError::YamlDocument`] for malformed
/// documents, and any validation error raised by [`Policy::new`].
pub fn load_policy_dir(dir: &Path, settings: &RunSettings) -> ConfigResult<Policy> {
    let trackers = config_files(&dir.join(TRACKERS_DIR))?
        .into_iter()
        .map(|path| read_document::<TrackerDocument>(&path)?.into_rule())
        .collect::<ConfigResult<Vec<_>>>()?;

    let mut clients = BTreeMap::new();
    for path in config_files(&dir.join(CLIENTS_DIR))? {
        let name = client_name(&path);
        let client = read_document::<ClientDocument>(&path)?.into_policy(&name)?;
        if clients.insert(name.clone(), client).is_some() {
            return Err(ConfigError::Duplicate {
                section: CLIENTS_DIR.to_string(),
                field: "name".to_string(),
                value: name,
            });
        }
    }

    let scoring = read_optional::<ScoringDocument>(dir, &SCORING_STEMS)?.unwrap_or_default();
    let tags = read_optional::<TagsDocument>(dir, &TAGS_STEMS)?.unwrap_or_default();

    let policy = Policy::new(PolicyParts {
        trackers,
        tags: tags.into(),
        scoring: scoring.into(),
        clients,
        checks: settings.checks,
        download_folder: settings.download_folder.clone(),
    })?;

    info!(
        path = %dir.display(),
        trackers = policy.trackers().len(),
        clients = policy.clients().len(),
        "policy loaded"
    );
    Ok(policy)
}

fn config_files(dir: &Path) -> ConfigResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| ConfigError::Io {
        operation: "config.read_dir",
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Io {
            operation: "config.read_dir_entry",
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && DocumentFormat::of(&path).is_some() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(ConfigError::EmptyDirectory {
            path: dir.to_path_buf(),
        });
    }
    files.sort();
    Ok(files)
}

fn client_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.split('_').next().unwrap_or_default().to_string()
}

fn read_document<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "config.read_document",
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "reading configuration document");
    match DocumentFormat::of(path) {
        Some(DocumentFormat::Json) => {
            serde_json::from_str(&raw).map_err(|source| ConfigError::Document {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => serde_yaml::from_str(&raw).map_err(|source| ConfigError::YamlDocument {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_optional<T: DeserializeOwned>(dir: &Path, stems: &[&str; 2]) -> ConfigResult<Option<T>> {
    let found = stems.iter().find_map(|stem| {
        DocumentFormat::EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|path| path.is_file())
    });
    match found {
        Some(path) => read_document(&path).map(Some),
        None => {
            debug!(dir = %dir.display(), document = stems[0], "document absent; using defaults");
            Ok(None)
        }
    }
}
