//! Output generation for console views and exports.
//!
//! # Submodules
//!
//! - [`markdown`]: renders dashboards, tables, galleries and lists for stdout
//! - [`json`]: writes a loaded snapshot to dated JSON files
//!
//! # Output Structure
//!
//! ```text
//! stdout                     # every view command
//!
//! export_dir/
//! └── 2025-05-06/
//!     ├── news.json
//!     ├── sheets.json
//!     └── ...
//! ```

pub mod json;
pub mod markdown;
