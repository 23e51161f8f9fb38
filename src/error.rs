use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum ProviderError {
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
    #[display("failed to read price file")]
    ReadFile,
}

#[derive(Debug, Display, Error)]
pub enum NormalizeError {
    #[display("missing required columns: {}", missing.join(", "))]
    MissingColumn { missing: Vec<String> },
    #[display("column {name} has {width} sub-columns and cannot be flattened")]
    AmbiguousColumn { name: String, width: usize },
    #[display("column {name} has {actual} values for {expected} rows")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
    #[display("series length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Display, Error)]
pub enum RenderError {
    #[display("failed to create output directory")]
    CreateDir,
    #[display("failed to serialize dashboard")]
    Serialize,
    #[display("failed to write output file")]
    Write,
}

#[derive(Debug, Display, Error)]
pub enum PipelineError {
    #[display("price table normalization failed")]
    Normalize,
    #[display("indicator computation failed")]
    Indicators,
}
