//! Errors surfaced by the module loader.
//!
//! Once a [`crate::Player`] has been constructed, decoding cannot fail:
//! ill-formed effect parameters are interpreted liberally, out-of-range
//! periods produce silence, and sample indices are clamped or ignored by
//! the `sample > 0` guard. Only loading a buffer can fail.

/// Error returned by [`crate::Player::from_bytes`] when a buffer cannot be
/// parsed as a ProTracker MOD file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    /// The buffer is shorter than the minimum plausible MOD file size.
    #[error("mod file too short: {len} bytes, need at least {min}")]
    FormatTooShort { len: usize, min: usize },

    /// The header declares a file layout (pattern count + sample data)
    /// that extends past the end of the supplied buffer.
    #[error("mod file corrupt: declared size {expected} exceeds buffer length {actual}")]
    FormatCorrupt { expected: usize, actual: usize },
}
