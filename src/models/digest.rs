/// A rendered digest, ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    /// Subject line, used by channels that have one
    pub subject: String,
    /// Full HTML document
    pub html: String,
    /// Plain-text rendition for chat channels
    pub text: String,
    /// Number of items in the digest
    pub item_count: usize,
}

impl Digest {
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}
