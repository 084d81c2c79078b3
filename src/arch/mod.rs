pub mod activations;
pub mod init;
pub mod layers;
pub mod ops;
mod params;

pub use params::NamedParams;
