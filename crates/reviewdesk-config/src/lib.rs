#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Client-side tunables for the review desk.
//!
//! Layout: `model.rs` (typed settings), `defaults.rs` (baseline values and
//! environment keys), `validate.rs` (parsing and range checks), `loader.rs`
//! (environment loading and overrides).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{BulkReplySettings, DeskConfig, FilterSettings, LogOutput, LogSettings};
