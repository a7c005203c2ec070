//! Document parser (verb module)
//!
//! Reads catalogs, validator configs, raw query documents and security
//! contexts from files or strings. Catalogs and configs are YAML; queries
//! and contexts are JSON, or YAML when the file extension says so.

use std::path::Path;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::ValidatorConfig;
use crate::context::SecurityContext;
use crate::error::ParseError;

pub(crate) fn read_file<P: AsRef<Path>>(path: P) -> Result<String, ParseError> {
    let path_str = path.as_ref().display().to_string();
    debug!(path = %path_str, "reading document");
    std::fs::read_to_string(&path).map_err(|e| ParseError::Io {
        path: path_str,
        source: e,
    })
}

/// Parse a catalog from a YAML file
pub fn parse_catalog_file<P: AsRef<Path>>(path: P) -> Result<Catalog, ParseError> {
    let contents = read_file(&path)?;
    let catalog = parse_catalog_str(&contents)?;
    info!(
        path = %path.as_ref().display(),
        cubes = catalog.cubes.len(),
        "loaded cube catalog"
    );
    Ok(catalog)
}

/// Parse a catalog from a YAML string
pub fn parse_catalog_str(yaml: &str) -> Result<Catalog, ParseError> {
    let catalog: Catalog = serde_yaml::from_str(yaml)?;
    catalog.check_names()?;
    Ok(catalog)
}

/// Parse a validator config from a YAML file
pub fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<ValidatorConfig, ParseError> {
    let contents = read_file(&path)?;
    parse_config_str(&contents)
}

/// Parse a validator config from a YAML string; missing keys keep their defaults
pub fn parse_config_str(yaml: &str) -> Result<ValidatorConfig, ParseError> {
    serde_yaml::from_str(yaml).map_err(ParseError::from)
}

/// Parse a raw query document from a JSON string
pub fn parse_query_str(json: &str) -> Result<serde_json::Value, ParseError> {
    serde_json::from_str(json).map_err(ParseError::from)
}

/// Parse a raw query document from a file.
///
/// `.yaml` and `.yml` files are read as YAML, everything else as JSON.
pub fn parse_query_file<P: AsRef<Path>>(path: P) -> Result<serde_json::Value, ParseError> {
    parse_document_file(path)
}

/// Parse a security context from a file, JSON or YAML by extension.
///
/// Any well-formed document is accepted; its content is never inspected.
pub fn parse_context_file<P: AsRef<Path>>(path: P) -> Result<SecurityContext, ParseError> {
    parse_document_file(path).map(SecurityContext::new)
}

fn parse_document_file<P: AsRef<Path>>(path: P) -> Result<serde_json::Value, ParseError> {
    let contents = read_file(&path)?;
    let is_yaml = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&contents).map_err(ParseError::from)
    } else {
        serde_json::from_str(&contents).map_err(ParseError::from)
    }
}
