mod batch_norm;
mod dense;

pub use batch_norm::BatchNorm;
pub use dense::Dense;
