//! Frame-to-phoneme classification.

pub mod classifier;
pub mod engine;
pub mod heuristic;
pub mod phoneme;

pub use classifier::{MockClassifier, PhonemeClassifier, init_classifier};
pub use engine::{EngineClassifier, EngineModel, LabelBand};
pub use heuristic::HeuristicClassifier;
pub use phoneme::PhonemeEvent;
