//! Output generation for the Markdown digest and its index.
//!
//! - [`markdown`]: Renders the ranked digest and the full entry list
//! - [`indexes`]: Keeps `daily_digest.md` pointing at every published digest
//!
//! # Output Structure
//!
//! ```text
//! markdown_output_dir/
//! ├── 2026-10-15.md
//! ├── 2026-10-16.md
//! └── daily_digest.md
//! ```

pub mod indexes;
pub mod markdown;
