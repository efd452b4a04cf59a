use thiserror::Error;

/// Failure to import a wire-encoded value into its native form.
///
/// Always recoverable by the caller: re-derive, re-hash or reject the input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("scalar encoding is not canonical")]
    NonCanonicalScalar,
    #[error("point encoding does not name a group element")]
    InvalidPoint,
}

/// A multi-party round was driven out of order, or fed unusable peer data.
///
/// Out-of-order phases are a caller bug and must not be silently tolerated.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("co-signing phase executed out of order")]
    PhaseOrder,
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
