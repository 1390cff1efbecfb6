//! Usage facts: what was found inside the content identified by a hash.
//!
//! Two parallel shapes exist, cryptographic primitive usage and known-library
//! detection. Both are looked up by content hash and de-duplicated by their
//! logical identity, never by the hash: several hashes (provenances) of the
//! same release routinely report the same fact.

/// A fact associated with a content hash.
pub trait UsageFact: Clone + Send + Sync + 'static {
    /// Logical identity used for de-duplication.
    type Key: Ord + Clone + Send;

    fn content_hash(&self) -> &str;

    fn identity(&self) -> Self::Key;
}

/// A cryptographic primitive used by the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmUsage {
    pub content_hash: String,
    /// e.g. `AES-128-GCM`, `SHA-1`, `RSA`.
    pub algorithm: String,
    /// Strength classification, e.g. `strong`, `weak`, `broken`.
    pub strength: String,
}

impl UsageFact for AlgorithmUsage {
    type Key = (String, String);

    fn content_hash(&self) -> &str {
        &self.content_hash
    }

    fn identity(&self) -> Self::Key {
        (self.algorithm.clone(), self.strength.clone())
    }
}

/// A known third-party cryptography library detected in the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDetection {
    pub content_hash: String,
    pub detection_id: String,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
}

impl UsageFact for LibraryDetection {
    type Key = String;

    fn content_hash(&self) -> &str {
        &self.content_hash
    }

    fn identity(&self) -> Self::Key {
        self.detection_id.clone()
    }
}
