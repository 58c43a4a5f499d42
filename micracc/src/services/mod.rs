//! Collaborator services at the pipeline boundary
//!
//! The core pipeline only sees these interfaces: something that turns a
//! check image into per-engine results, something that knows the
//! recorded ground truth, and something that hands over image bytes.

pub mod ground_truth;
pub mod images;
pub mod recognizer;

pub use ground_truth::{GroundTruthSource, JsonGroundTruth};
pub use images::{DirImageSource, ImageSource};
pub use recognizer::{AnyRecognizer, FixtureRecognizer, RecognizeError, Recognizer, RemoteRecognizer};
