pub type Result<T> = std::result::Result<T, Error>;
pub type ParseResult<T> = std::result::Result<T, ParseError>;
pub type ValidateResult<T> = std::result::Result<T, ValidateError>;
pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Errors raised while decoding an encoded map.
///
/// These are always fatal to construction: a consumer is never left in a
/// partially parsed state. `Clone` is required because the lazily computed
/// mapping views cache a parse failure and replay it to every later query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("unsupported source map format")]
    UnsupportedFormat,
    #[error("source map syntax error: {0}")]
    Syntax(String),
    #[error("a mapping is malformed: \"{0}\"")]
    MappingMalformed(String),
    #[error("invalid base64 digit {0:#04x} in mappings")]
    InvalidBase64(u8),
    #[error("expected more digits in base64 VLQ value")]
    VlqTruncated,
    #[error("base64 VLQ value out of range")]
    VlqOverflow,
    #[error("a mapping references unknown source #{0}")]
    UnknownSourceReference(u32),
    #[error("a mapping references unknown name #{0}")]
    UnknownNameReference(u32),
    #[error("source map has {sources} sources but {sources_content} sourcesContent entries")]
    MismatchedSourcesContent { sources: u32, sources_content: u32 },
    #[error("support for the url field in sections is not implemented")]
    SectionUrlUnsupported,
    #[error("a section is missing its map")]
    SectionMissingMap,
    #[error("section offsets must be ordered and non-overlapping")]
    SectionsUnordered,
}

impl From<simd_json::Error> for ParseError {
    fn from(value: simd_json::Error) -> Self {
        Self::Syntax(value.to_string())
    }
}

/// Errors raised when feeding inconsistent records into a generator.
///
/// Fatal unless validation is explicitly skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ValidateError {
    #[error("invalid mapping: {0}")]
    InvalidMapping(String),
    #[error("applying a source map requires an explicit source file or the applied map's file field")]
    MissingSourceFile,
}

/// Errors raised by strict lookups.
///
/// A query that finds no mapping is not an error; these cover lookups of
/// values the caller asserts to exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LookupError {
    #[error("\"{0}\" is not in the set")]
    NotFound(String),
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: u32, len: u32 },
    #[error("\"{0}\" is not in the source map")]
    UnknownSource(String),
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validate(#[from] ValidateError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}
