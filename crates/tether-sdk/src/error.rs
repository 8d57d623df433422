//! Error types for the tether ABI

/// Result type for ABI conversions
pub type AbiResult<T> = Result<T, AbiError>;

/// Errors raised while interpreting boundary shapes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    /// A descriptor carried a tag outside the published set
    #[error("Unknown value tag: {0}")]
    UnknownTag(u8),

    /// An owning descriptor was built around a null handle
    #[error("Null handle for owning tag {0}")]
    NullHandle(&'static str),

    /// An inline tag was given where an owning one is required
    #[error("Tag {0} does not carry a handle")]
    NotOwning(&'static str),
}
