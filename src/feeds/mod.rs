//! Feed sources and their entries.
//!
//! Loading follows three steps:
//!
//! 1. **Sources**: read the YAML feed lists from the resource directory ([`sources`])
//! 2. **Fetching**: download each feed over HTTP, one at a time ([`loader`])
//! 3. **Parsing**: turn RSS 2.0, RSS 1.0 or Atom documents into entries ([`parser`])
//!
//! A feed that fails is skipped and counted unless the run is strict, in
//! which case the failure aborts the run.

pub mod loader;
pub mod parser;
pub mod sources;
