pub mod arch;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod weights;

pub use error::{Result, ZooErr};
pub use models::{Device, Loss, ModelArgs, ModelSummary, Output, ReidNet};
pub use registry::{Registry, build_model, list_available_models, show_available_models};
pub use weights::{LoadReport, WeightStore};
