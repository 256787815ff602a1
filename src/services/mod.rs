pub mod digest;
pub mod notify;
pub mod opml;
pub mod render;
pub mod rss;

pub use digest::*;
pub use notify::*;
pub use opml::*;
pub use render::*;
pub use rss::*;
