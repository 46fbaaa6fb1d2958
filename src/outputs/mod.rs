//! Everything the stages write to disk.
//!
//! # Submodules
//!
//! - [`url_files`]: per-page URL lists written by `collect`, read by `fetch`
//! - [`json`]: the resumable article store
//! - [`images`]: downloaded article images
//!
//! # Output Structure
//!
//! ```text
//! urls/
//! ├── page_19_urls.txt
//! └── page_20_urls.txt
//! backup.json          # standard layout store
//! backup_beta.json     # beta layout store
//! images/
//! └── lead.jpg
//! ```

pub mod images;
pub mod json;
pub mod url_files;
