//! Spam/scam classification: the trait seam for external classifiers plus a
//! built-in keyword heuristic usable without any model.

pub mod classifier;
pub mod keyword;

pub use classifier::{Classification, MockClassifier, SpamClassifier};
pub use keyword::KeywordClassifier;
