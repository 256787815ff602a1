mod digest_renderer;

pub use digest_renderer::*;
