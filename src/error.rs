//! Structured error types for xlchart.
//!
//! Only [`XlchartError::CorruptContainer`] raised while opening a package is
//! fatal to an extraction. Everything else is local to one entry, one link,
//! one chart or one series, and callers log it and move on.

/// All errors that can occur while extracting, resolving and plotting charts.
#[derive(Debug, thiserror::Error)]
pub enum XlchartError {
    /// The package has no readable end-of-central-directory record, or an
    /// entry's data lies outside the buffer.
    #[error("Corrupt container: {0}")]
    CorruptContainer(String),

    /// An entry uses a compression method we cannot decode.
    #[error("Unsupported encoding for {path}: method {method}")]
    UnsupportedEntryEncoding { path: String, method: u16 },

    /// The requested part is not in the package.
    #[error("Missing entry: {0}")]
    MissingEntry(String),

    /// A relationship id has no matching entry in the `.rels` part.
    #[error("Missing relationship target {id} in {source_part}")]
    MissingRelationshipTarget { source_part: String, id: String },

    /// A drawing anchors a chart whose relationship does not lead to a part.
    #[error("Dangling chart reference {id} in {drawing}")]
    DanglingChartReference { drawing: String, id: String },

    /// No known chart-type element was found under the plot area.
    #[error("Unrecognized chart family in {0}")]
    UnrecognizedChartFamily(String),

    /// A range reference could not be turned into cell coordinates.
    #[error("Unresolvable reference: {0}")]
    UnresolvableReference(String),

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML tree parsing error from roxmltree.
    #[error("XML document: {0}")]
    Dom(#[from] roxmltree::Error),

    /// ZIP archive error from the library fallback reader.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Plotting surface failure.
    #[error("Render error: {0}")]
    Render(String),

    /// Invalid configuration file.
    #[error("Config error: {0}")]
    Config(String),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlchartError>;

impl From<String> for XlchartError {
    fn from(s: String) -> Self {
        Self::Parse(s)
    }
}

impl From<&str> for XlchartError {
    fn from(s: &str) -> Self {
        Self::Parse(s.to_string())
    }
}

impl From<serde_json::Error> for XlchartError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}
