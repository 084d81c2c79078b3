use ndarray::{linalg, prelude::*};
use rand::Rng;

use crate::{
    Result, ZooErr,
    arch::{activations::ActFn, init::Init, params::NamedParams},
};

/// A fully connected layer, `a = act_fn(x · w + b)`.
#[derive(Clone, Debug)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    w: Array2<f32>,
    b: Array1<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer with freshly initialized parameters.
    ///
    /// # Arguments
    /// * `dim` - The `(input, output)` dimension of the layer.
    /// * `act_fn` - The activation function applied to the output, if any.
    /// * `init` - How the weights are initialized.
    /// * `rng` - A random number generator.
    pub fn new<R: Rng + ?Sized>(
        dim: (usize, usize),
        act_fn: Option<ActFn>,
        init: Init,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Self {
            dim,
            act_fn,
            w: init.weights(dim, rng)?,
            b: init.biases(dim.1),
        })
    }

    /// Returns the `(input, output)` dimension of this layer.
    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        (self.dim.0 + 1) * self.dim.1
    }

    /// Makes a forward pass through the layer.
    ///
    /// # Arguments
    /// * `x` - A batch of inputs, one row per sample.
    ///
    /// # Returns
    /// The activations of the layer or an error if `x` has the wrong width.
    pub fn forward(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(ZooErr::SizeMismatch {
                what: "dense layer input",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &self.w, 0.0, &mut z);
        z += &self.b;

        if let Some(act_fn) = self.act_fn {
            z.mapv_inplace(|z| act_fn.f(z));
        }

        Ok(z)
    }
}

impl NamedParams for Dense {
    fn params<'a>(&'a self, prefix: &str, out: &mut Vec<(String, ArrayViewD<'a, f32>)>) {
        out.push((format!("{prefix}.weight"), self.w.view().into_dyn()));
        out.push((format!("{prefix}.bias"), self.b.view().into_dyn()));
    }

    fn params_mut<'a>(
        &'a mut self,
        prefix: &str,
        out: &mut Vec<(String, ArrayViewMutD<'a, f32>)>,
    ) {
        out.push((format!("{prefix}.weight"), self.w.view_mut().into_dyn()));
        out.push((format!("{prefix}.bias"), self.b.view_mut().into_dyn()));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn identity_dense(act_fn: Option<ActFn>) -> Dense {
        let mut rng = StdRng::seed_from_u64(0);
        let mut dense = Dense::new((2, 2), act_fn, Init::Kaiming, &mut rng).unwrap();

        let mut params = Vec::new();
        dense.params_mut("fc", &mut params);
        for (name, mut view) in params {
            match name.as_str() {
                "fc.weight" => view.assign(&arr2(&[[1., 0.], [0., 1.]]).into_dyn()),
                "fc.bias" => view.assign(&arr1(&[0.5, -10.]).into_dyn()),
                other => panic!("unexpected parameter {other}"),
            }
        }

        dense
    }

    #[test]
    fn forward_applies_weights_bias_and_activation() {
        let x = arr2(&[[1., 2.], [3., 4.]]);

        let linear = identity_dense(None);
        assert_eq!(linear.forward(x.view()).unwrap(), arr2(&[[1.5f32, -8.], [3.5, -6.]]));

        let relu = identity_dense(Some(ActFn::relu()));
        assert_eq!(relu.forward(x.view()).unwrap(), arr2(&[[1.5f32, 0.], [3.5, 0.]]));
    }

    #[test]
    fn forward_rejects_wrong_width() {
        let dense = identity_dense(None);
        let x = Array2::<f32>::zeros((1, 3));

        assert!(matches!(
            dense.forward(x.view()),
            Err(ZooErr::SizeMismatch { got: 3, expected: 2, .. })
        ));
    }

    #[test]
    fn size_counts_weights_and_biases() {
        let mut rng = StdRng::seed_from_u64(0);
        let dense = Dense::new((3, 4), None, Init::Kaiming, &mut rng).unwrap();
        assert_eq!(dense.size(), 16);
    }
}
