use ndarray::prelude::*;

use crate::{
    Result, ZooErr,
    arch::params::NamedParams,
};

const EPSILON: f32 = 1e-5;
const MOMENTUM: f32 = 0.1;

/// Batch normalization over the features of a `(batch, features)` matrix.
///
/// In training mode the batch statistics normalize the input and are folded into the running
/// statistics, in eval mode the running statistics are used instead.
#[derive(Clone, Debug)]
pub struct BatchNorm {
    dim: usize,
    gamma: Array1<f32>,
    beta: Array1<f32>,
    running_mean: Array1<f32>,
    running_var: Array1<f32>,
}

impl BatchNorm {
    /// Creates a new `BatchNorm` over `dim` features, initialized to the identity transform.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            gamma: Array1::ones(dim),
            beta: Array1::zeros(dim),
            running_mean: Array1::zeros(dim),
            running_var: Array1::ones(dim),
        }
    }

    /// Returns the amount of trainable parameters, running statistics excluded.
    pub fn size(&self) -> usize {
        2 * self.dim
    }

    /// Normalizes a batch.
    ///
    /// # Arguments
    /// * `x` - A batch of inputs, one row per sample.
    /// * `training` - Whether to normalize with the batch statistics and update the running ones.
    ///
    /// # Returns
    /// The normalized batch or an error if `x` is empty or has the wrong width, or if a training
    /// batch holds a single sample.
    pub fn forward(&mut self, x: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        if x.ncols() != self.dim {
            return Err(ZooErr::SizeMismatch {
                what: "batch norm input",
                got: x.ncols(),
                expected: self.dim,
            });
        }

        let (mean, var) = if training {
            let n = x.nrows();
            let mean = x.mean_axis(Axis(0)).ok_or(ZooErr::EmptyInput)?;
            if n < 2 {
                return Err(ZooErr::BatchTooSmall { got: n });
            }

            let var = x.var_axis(Axis(0), 0.);
            let unbiased = &var * (n as f32 / (n - 1) as f32);
            self.running_mean = &self.running_mean * (1. - MOMENTUM) + &mean * MOMENTUM;
            self.running_var = &self.running_var * (1. - MOMENTUM) + unbiased * MOMENTUM;

            (mean, var)
        } else {
            (self.running_mean.clone(), self.running_var.clone())
        };

        let scale = &self.gamma / var.mapv(|v| (v + EPSILON).sqrt());
        Ok((&x - &mean) * &scale + &self.beta)
    }
}

impl NamedParams for BatchNorm {
    fn params<'a>(&'a self, prefix: &str, out: &mut Vec<(String, ArrayViewD<'a, f32>)>) {
        out.push((format!("{prefix}.weight"), self.gamma.view().into_dyn()));
        out.push((format!("{prefix}.bias"), self.beta.view().into_dyn()));
        out.push((format!("{prefix}.running_mean"), self.running_mean.view().into_dyn()));
        out.push((format!("{prefix}.running_var"), self.running_var.view().into_dyn()));
    }

    fn params_mut<'a>(
        &'a mut self,
        prefix: &str,
        out: &mut Vec<(String, ArrayViewMutD<'a, f32>)>,
    ) {
        out.push((format!("{prefix}.weight"), self.gamma.view_mut().into_dyn()));
        out.push((format!("{prefix}.bias"), self.beta.view_mut().into_dyn()));
        out.push((format!("{prefix}.running_mean"), self.running_mean.view_mut().into_dyn()));
        out.push((format!("{prefix}.running_var"), self.running_var.view_mut().into_dyn()));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn training_normalizes_with_batch_statistics() {
        let mut bn = BatchNorm::new(2);
        let x = arr2(&[[1f32, 10.], [3., 30.]]);

        let y = bn.forward(x.view(), true).unwrap();

        for col in y.columns() {
            assert!(col.mean().unwrap().abs() < 1e-5);
            assert!((col[0] + 1.).abs() < 1e-3);
            assert!((col[1] - 1.).abs() < 1e-3);
        }
    }

    #[test]
    fn training_updates_running_statistics() {
        let mut bn = BatchNorm::new(1);
        let x = arr2(&[[2f32], [4.]]);

        bn.forward(x.view(), true).unwrap();

        // mean 3, unbiased var 2
        assert!((bn.running_mean[0] - 0.3).abs() < 1e-6);
        assert!((bn.running_var[0] - (0.9 + 0.2)).abs() < 1e-6);
    }

    #[test]
    fn eval_is_identity_when_fresh() {
        let mut bn = BatchNorm::new(3);
        let x = arr2(&[[1f32, -2., 0.5]]);

        let y = bn.forward(x.view(), false).unwrap();
        for (a, b) in y.iter().zip(x.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn empty_batch_is_rejected_in_training() {
        let mut bn = BatchNorm::new(2);
        let x = Array2::<f32>::zeros((0, 2));
        assert!(matches!(bn.forward(x.view(), true), Err(ZooErr::EmptyInput)));
    }

    #[test]
    fn single_sample_is_rejected_in_training_only() {
        let mut bn = BatchNorm::new(2);
        let x = arr2(&[[1f32, 2.]]);

        assert!(matches!(
            bn.forward(x.view(), true),
            Err(ZooErr::BatchTooSmall { got: 1 })
        ));
        assert_eq!(bn.running_var, Array1::<f32>::ones(2));
        assert!(bn.forward(x.view(), false).is_ok());
    }
}
