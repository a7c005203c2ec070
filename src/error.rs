//! Error types for loading catalogs, configs and query documents

/// Errors that can occur while reading input documents
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// IO error reading file
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// YAML deserialization error
    #[error("Invalid YAML: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },
    /// JSON deserialization error
    #[error("Invalid JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    /// Catalog parsed but names members that cannot be queried
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}
