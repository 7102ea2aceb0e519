//! TOML file loading and `<category>-<os>...` section-name parsing.
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

use super::catalog::Category;
use crate::error::ConfigError;
use crate::platform::Os;

/// Load a TOML file into `T`, or `T`'s empty-document value when the file is
/// missing.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return parse_str("", &path.display().to_string());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_str(&content, &path.display().to_string())
}

/// Parse TOML text, labelling errors with `file`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSyntax`] if the text does not deserialize.
pub fn parse_str<T: DeserializeOwned>(content: &str, file: &str) -> Result<T, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::InvalidSyntax {
        file: file.to_string(),
        message: e.message().to_string(),
    })
}

/// Parse a document whose top-level keys are sections of type `S`, returning
/// `(section_name, section)` pairs sorted by name.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSyntax`] if any section fails to deserialize.
pub fn parse_sections<S: DeserializeOwned>(
    content: &str,
    file: &str,
) -> Result<Vec<(String, S)>, ConfigError> {
    let sections: BTreeMap<String, S> = parse_str(content, file)?;
    Ok(sections.into_iter().collect())
}

/// A parsed section name: a category plus an optional OS restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionName {
    /// Category the section's entries belong to.
    pub category: Category,
    /// OS restriction from the name suffix; `None` keeps backend defaults.
    pub platforms: Option<Vec<Os>>,
}

/// Parse `essential`, `dotfile-macos-linux`, and similar section names.
///
/// # Errors
///
/// Returns a human-readable message naming the unrecognised tag.
pub fn parse_section_name(name: &str) -> Result<SectionName, String> {
    let mut tags = name.split('-');
    let head = tags.next().unwrap_or_default();
    let category =
        Category::from_tag(head).ok_or_else(|| format!("unknown category '{head}'"))?;

    let mut platforms = Vec::new();
    for tag in tags {
        let os = Os::from_tag(tag).ok_or_else(|| format!("unknown platform tag '{tag}'"))?;
        if !platforms.contains(&os) {
            platforms.push(os);
        }
    }

    Ok(SectionName {
        category,
        platforms: (!platforms.is_empty()).then_some(platforms),
    })
}
