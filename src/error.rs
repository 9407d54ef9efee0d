use starknet::core::utils::NonAsciiNameError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading an ABI document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed ABI JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ABI document must be a JSON array of entries")]
    NotAnArray,
    #[error("ABI entry {index} is missing its `type` field")]
    MissingType { index: usize },
    #[error("ABI entry {index} has unknown type `{kind}`")]
    UnknownType { index: usize, kind: String },
    #[error("ABI entry {index} (`{kind}`) is malformed: {source}")]
    InvalidEntry {
        index: usize,
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid type `{ty}`: {reason}")]
    TypeSyntax { ty: String, reason: String },
    #[error("argument count mismatch: {args} arguments, {values} values")]
    Arity { args: usize, values: usize },
    #[error("cannot encode {found} as `{expected}`")]
    TypeConversion { expected: String, found: String },
    #[error("value {value} is out of range for `{ty}`")]
    Overflow { value: String, ty: String },
    #[error("not enough data to decode `{ty}`: need {needed} more felt(s), {available} available")]
    TruncatedData {
        ty: String,
        needed: usize,
        available: usize,
    },
    #[error("type `{0}` cannot be encoded without a matching struct definition")]
    UnsupportedType(String),
    #[error("type `{0}` nests deeper than the codec allows")]
    RecursionLimit(String),
    #[error("Starknet selector error: {0}")]
    Selector(#[from] NonAsciiNameError),
}

impl Error {
    pub(crate) fn conversion(expected: &str, found: impl Into<String>) -> Self {
        Self::TypeConversion {
            expected: expected.to_string(),
            found: found.into(),
        }
    }

    pub(crate) fn overflow(value: impl ToString, ty: &str) -> Self {
        Self::Overflow {
            value: value.to_string(),
            ty: ty.to_string(),
        }
    }

    pub(crate) fn truncated(ty: &str, needed: usize, available: usize) -> Self {
        Self::TruncatedData {
            ty: ty.to_string(),
            needed,
            available,
        }
    }
}
