use thiserror::Error;

/// Parse failure with the source position the scanner stopped at.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed JSON source at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    MalformedSource(#[from] ParseError),
    /// The document's last parse did not succeed; edits are refused until a
    /// re-read succeeds or the caller forces a rewrite of the default value.
    #[error("document has not been read successfully, refusing to make edit")]
    StaleDocument,
    /// The edit addresses an object/array but the node at that position is
    /// something else. The backing file no longer matches the expected shape.
    #[error("edit expects {expected} but node is {actual}")]
    SchemaMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("attempted to perform update on missing {0}")]
    MissingTarget(String),
    /// The backing store refused the atomic replacement. Transient; retry
    /// after the next re-read.
    #[error("backing store rejected the replacement")]
    HostRejected,
    #[error("document was never read successfully and the file exists, refusing to overwrite")]
    RefusedOverwrite,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
