use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (missing carrier, bad pair, empty field name, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A carrier referenced by the pair is not declared.
    #[error("unknown carrier: {0}")]
    UnknownCarrier(String),
    /// No dataset was supplied for a paired carrier.
    #[error("no dataset loaded for carrier '{0}'")]
    MissingDataset(String),
    /// A required field is absent from a dataset's columns.
    #[error("carrier '{carrier}': missing column '{column}'")]
    MissingColumn { carrier: String, column: String },
    /// Measure column holds a non-numeric or missing value.
    #[error("carrier '{carrier}', column '{column}', row {row}: cannot sum value '{value}'")]
    TypeMismatch {
        carrier: String,
        column: String,
        /// 1-based data row index (header excluded).
        row: usize,
        value: String,
    },
}
