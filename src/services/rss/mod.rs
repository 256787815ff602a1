mod rss_service;

pub use rss_service::*;
