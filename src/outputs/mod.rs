//! Output generation for the terminal and for JSON files.
//!
//! # Submodules
//!
//! - [`text`]: Renders cards, facet chips and status lines, and hosts the
//!   interactive [`text::TerminalView`]
//! - [`json`]: Writes a feed snapshot to a date-stamped JSON file
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2024-01-10/
//!     └── 170000.json
//! ```

pub mod json;
pub mod text;
