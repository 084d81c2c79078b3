use std::num::NonZeroUsize;

use ndarray::{ArrayViewD, ArrayViewMutD, prelude::*};
use rand::Rng;

use crate::{
    Result,
    arch::{
        NamedParams,
        activations::ActFn,
        init::Init,
        layers::{BatchNorm, Dense},
    },
};

const CLASSIFIER_STD_DEV: f32 = 0.01;

/// Dimension reduction in front of a classifier: dense, batch norm and relu.
#[derive(Clone, Debug)]
struct Bottleneck {
    dense: Dense,
    norm: BatchNorm,
    act_fn: ActFn,
}

impl Bottleneck {
    fn forward(&mut self, x: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        let z = self.dense.forward(x)?;
        let mut a = self.norm.forward(z.view(), training)?;
        let act_fn = self.act_fn;
        a.mapv_inplace(|a| act_fn.f(a));
        Ok(a)
    }
}

/// One output branch of a network: an optional bottleneck and an identity classifier.
#[derive(Clone, Debug)]
pub struct Head {
    bottleneck: Option<Bottleneck>,
    classifier: Dense,
}

impl Head {
    /// Creates a new `Head`.
    ///
    /// # Arguments
    /// * `input_dim` - The width of the features the head receives.
    /// * `bottleneck` - The width of the bottleneck, if any.
    /// * `num_classes` - The number of identities the classifier distinguishes.
    /// * `rng` - A random number generator for the initial weights.
    pub fn new<R: Rng + ?Sized>(
        input_dim: usize,
        bottleneck: Option<usize>,
        num_classes: NonZeroUsize,
        rng: &mut R,
    ) -> Result<Self> {
        let bottleneck = bottleneck
            .map(|dim| -> Result<Bottleneck> {
                Ok(Bottleneck {
                    dense: Dense::new((input_dim, dim), None, Init::Kaiming, rng)?,
                    norm: BatchNorm::new(dim),
                    act_fn: ActFn::relu(),
                })
            })
            .transpose()?;

        let embedding_dim = bottleneck.as_ref().map_or(input_dim, |b| b.dense.dim().1);
        let classifier = Dense::new(
            (embedding_dim, num_classes.get()),
            None,
            Init::Normal {
                std_dev: CLASSIFIER_STD_DEV,
            },
            rng,
        )?;

        Ok(Self {
            bottleneck,
            classifier,
        })
    }

    /// Returns the amount of trainable parameters in the head.
    pub fn size(&self) -> usize {
        let bottleneck = self
            .bottleneck
            .as_ref()
            .map_or(0, |b| b.dense.size() + b.norm.size());

        bottleneck + self.classifier.size()
    }

    /// Maps the head's features to its embedding.
    ///
    /// # Arguments
    /// * `x` - The head's slice of the backbone output.
    /// * `training` - Whether the bottleneck's batch norm runs in training mode.
    pub fn embed(&mut self, x: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        match &mut self.bottleneck {
            Some(bottleneck) => bottleneck.forward(x, training),
            None => Ok(x.to_owned()),
        }
    }

    /// Computes the identity logits of an embedding.
    pub fn classify(&self, embedding: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.classifier.forward(embedding)
    }
}

impl NamedParams for Head {
    fn params<'a>(&'a self, prefix: &str, out: &mut Vec<(String, ArrayViewD<'a, f32>)>) {
        if let Some(bottleneck) = &self.bottleneck {
            bottleneck.dense.params(&format!("{prefix}.bottleneck.dense"), out);
            bottleneck.norm.params(&format!("{prefix}.bottleneck.norm"), out);
        }

        self.classifier.params(&format!("{prefix}.classifier"), out);
    }

    fn params_mut<'a>(
        &'a mut self,
        prefix: &str,
        out: &mut Vec<(String, ArrayViewMutD<'a, f32>)>,
    ) {
        if let Some(bottleneck) = &mut self.bottleneck {
            bottleneck.dense.params_mut(&format!("{prefix}.bottleneck.dense"), out);
            bottleneck.norm.params_mut(&format!("{prefix}.bottleneck.norm"), out);
        }

        self.classifier.params_mut(&format!("{prefix}.classifier"), out);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn classes(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn bottleneck_reduces_the_embedding() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut head = Head::new(16, Some(4), classes(5), &mut rng).unwrap();
        let x = Array2::from_shape_fn((3, 16), |(i, j)| (i * 16 + j) as f32 / 48.);

        let embedding = head.embed(x.view(), true).unwrap();
        assert_eq!(embedding.dim(), (3, 4));
        assert!(embedding.iter().all(|e| *e >= 0.));

        let logits = head.classify(embedding.view()).unwrap();
        assert_eq!(logits.dim(), (3, 5));
        assert_eq!(head.size(), (16 + 1) * 4 + 2 * 4 + (4 + 1) * 5);
    }

    #[test]
    fn without_bottleneck_the_input_is_the_embedding() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut head = Head::new(6, None, classes(2), &mut rng).unwrap();
        let x = Array2::from_elem((2, 6), 1f32);

        assert_eq!(head.embed(x.view(), false).unwrap(), x);
        assert_eq!(head.classify(x.view()).unwrap().dim(), (2, 2));
    }
}
