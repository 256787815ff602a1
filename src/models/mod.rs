pub mod digest;
pub mod entry;
pub mod feed;

pub use digest::Digest;
pub use entry::{DigestItem, Entry};
pub use feed::{FeedFormat, FeedSource};
