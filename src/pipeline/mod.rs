//! Change-detection pipeline.
//!
//! - `fingerprint`: Change tokens for snapshots
//! - `render`: Fixed-width schedule tables
//! - `poller`: The fetch → compare → notify → persist loop

pub mod fingerprint;
pub mod poller;
pub mod render;

pub use fingerprint::{content_hash, fingerprint};
pub use poller::{CycleOutcome, Poller, Preview};
pub use render::TableRenderer;
