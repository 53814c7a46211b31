use thiserror::Error;

/// Errors that can occur while decoding wire primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The stream ended before the value was complete
    #[error("unexpected end of stream: needed {needed} more bytes, {remaining} remain")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// A boolean byte held something other than 0 or 1 (SECURITY: potentially malformed packet)
    #[error("invalid boolean byte {value} (valid values: 0-1). This may indicate a malformed packet")]
    InvalidBool { value: u8 },

    /// A variable-length integer ran past the width of its target type
    #[error("variable-length integer exceeds 32 bits")]
    PackedOverflow,
}
