use std::mem;

use ndarray::{ArrayViewD, ArrayViewMutD, concatenate, prelude::*};
use rand::Rng;

use super::Blueprint;
use crate::{
    Result, ZooErr,
    arch::{NamedParams, activations::ActFn, init::Init, layers::Dense, ops},
};

/// Channels of the images a backbone accepts.
pub const IMAGE_CHANNELS: usize = 3;

/// The feature extractor of a network: global average pooling followed by one dense stage per
/// blueprint width, with an optional mid-level branch concatenated to the output.
#[derive(Clone, Debug)]
pub struct Backbone {
    stages: Vec<Dense>,
    fuse: Option<Dense>,
}

impl Backbone {
    /// Creates a new `Backbone` following a blueprint.
    ///
    /// # Arguments
    /// * `blueprint` - The architecture description.
    /// * `rng` - A random number generator for the initial weights.
    ///
    /// # Returns
    /// The backbone or an error if the blueprint has no stages.
    pub fn new<R: Rng + ?Sized>(blueprint: &Blueprint, rng: &mut R) -> Result<Self> {
        if blueprint.stages.is_empty() {
            return Err(ZooErr::SizeMismatch {
                what: "backbone stages",
                got: 0,
                expected: 1,
            });
        }

        let mut fan_in = IMAGE_CHANNELS;
        let mut last_fan_in = fan_in;
        let mut stages = Vec::with_capacity(blueprint.stages.len());

        for &width in blueprint.stages {
            stages.push(Dense::new((fan_in, width), Some(ActFn::relu()), Init::Kaiming, rng)?);
            last_fan_in = fan_in;
            fan_in = width;
        }

        let fuse = blueprint
            .fuse
            .map(|width| Dense::new((last_fan_in, width), Some(ActFn::relu()), Init::Kaiming, rng))
            .transpose()?;

        Ok(Self { stages, fuse })
    }

    /// Returns the width of the backbone's output.
    pub fn output_dim(&self) -> usize {
        let last = self.stages.last().map_or(IMAGE_CHANNELS, |stage| stage.dim().1);
        last + self.fuse.as_ref().map_or(0, |fuse| fuse.dim().1)
    }

    /// Returns the amount of parameters in the backbone.
    pub fn size(&self) -> usize {
        self.stages.iter().chain(&self.fuse).map(Dense::size).sum()
    }

    /// Extracts the features of an image batch.
    ///
    /// # Arguments
    /// * `images` - A `(batch, channels, height, width)` image batch.
    ///
    /// # Returns
    /// A `(batch, output_dim)` feature matrix or an error if the images are malformed.
    pub fn forward(&self, images: ArrayView4<f32>) -> Result<Array2<f32>> {
        let channels = images.dim().1;
        if channels != IMAGE_CHANNELS {
            return Err(ZooErr::SizeMismatch {
                what: "image channels",
                got: channels,
                expected: IMAGE_CHANNELS,
            });
        }

        let mut x = ops::global_avg_pool(images)?;
        let mut last_input = x.clone();

        for stage in &self.stages {
            let next = stage.forward(x.view())?;
            last_input = mem::replace(&mut x, next);
        }

        let Some(fuse) = &self.fuse else {
            return Ok(x);
        };

        let mid = fuse.forward(last_input.view())?;
        Ok(concatenate(Axis(1), &[x.view(), mid.view()])?)
    }
}

impl NamedParams for Backbone {
    fn params<'a>(&'a self, prefix: &str, out: &mut Vec<(String, ArrayViewD<'a, f32>)>) {
        for (i, stage) in self.stages.iter().enumerate() {
            stage.params(&format!("{prefix}.stages.{i}"), out);
        }

        if let Some(fuse) = &self.fuse {
            fuse.params(&format!("{prefix}.fuse"), out);
        }
    }

    fn params_mut<'a>(
        &'a mut self,
        prefix: &str,
        out: &mut Vec<(String, ArrayViewMutD<'a, f32>)>,
    ) {
        for (i, stage) in self.stages.iter_mut().enumerate() {
            stage.params_mut(&format!("{prefix}.stages.{i}"), out);
        }

        if let Some(fuse) = &mut self.fuse {
            fuse.params_mut(&format!("{prefix}.fuse"), out);
        }
    }
}
