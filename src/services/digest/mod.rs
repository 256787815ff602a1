//! The digest pipeline: fetch, window, dedupe, rank, render, deliver.

mod dedup;
mod digest_service;
mod rank;
mod window;

pub use dedup::{dedupe, normalize_link, normalize_title};
pub use digest_service::{DigestService, RunReport};
pub use rank::rank;
pub use window::filter_window;
