use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Normal;

use crate::Result;

/// How the weights of a dense layer get their starting values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Init {
    /// Kaiming normal initialization, `std = sqrt(2 / fan_in)`.
    Kaiming,
    /// Zero-mean normal initialization with a fixed standard deviation.
    Normal { std_dev: f32 },
}

impl Init {
    /// Samples a weight matrix shaped `(fan_in, fan_out)`.
    ///
    /// # Arguments
    /// * `dim` - The `(fan_in, fan_out)` dimension of the layer.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// The sampled weights or an error if the standard deviation is not finite.
    pub fn weights<R: Rng + ?Sized>(
        &self,
        dim: (usize, usize),
        rng: &mut R,
    ) -> Result<Array2<f32>> {
        let std_dev = match *self {
            Init::Kaiming => (2. / dim.0 as f32).sqrt(),
            Init::Normal { std_dev } => std_dev,
        };

        Ok(Array2::random_using(dim, Normal::new(0., std_dev)?, rng))
    }

    /// Biases always start at zero.
    pub fn biases(&self, size: usize) -> Array1<f32> {
        Array1::zeros(size)
    }
}
