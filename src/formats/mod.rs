//! File format parsers. Only ProTracker MOD is in scope (see spec
//! non-goals: XM, S3M, IT, and other tracker variants are not handled).

mod modfile;

pub use modfile::parse;
