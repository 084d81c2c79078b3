mod args;
mod backbone;
mod blueprint;
pub mod catalog;
mod head;
mod net;

pub use args::{Device, Loss, ModelArgs};
pub use backbone::{Backbone, IMAGE_CHANNELS};
pub use blueprint::{Blueprint, EvalFeatures, Family, Pretrained};
pub use head::Head;
pub use net::{ModelSummary, Output, ReidNet};
