mod opml_service;

pub use opml_service::*;
