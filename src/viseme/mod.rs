//! Viseme categories and temporal smoothing.

pub mod category;
pub mod smoother;

pub use category::{VisemeCategory, map_label};
pub use smoother::VisemeSmoother;
