//! A pure ProTracker MOD decoder: parses a 4-channel `.mod` byte buffer
//! and renders it to interleaved PCM at an arbitrary output sample rate.
//!
//! Reading a file from disk, writing WAV headers, and audio device output
//! are left to callers (see the `modplayer` binary in this crate for an
//! example using [`hound`](https://docs.rs/hound) and
//! [`cpal`](https://docs.rs/cpal)). This crate does no I/O, holds no
//! global state, and is safe to drive from multiple threads as long as
//! each [`Player`] instance is only touched from one thread at a time.

mod bytereader;
mod engine;
mod error;
mod formats;
mod module;
pub mod tracker;

pub use engine::Player;
pub use error::ModuleError;
pub use module::{Module, Note, Pattern, Sample};
