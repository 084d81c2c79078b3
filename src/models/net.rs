use log::{debug, info};
use ndarray::{ArrayViewD, ArrayViewMutD, concatenate, prelude::*};
use serde::Serialize;

use super::{Backbone, Blueprint, Device, EvalFeatures, Family, Head, Loss, ModelArgs};
use crate::{
    Result, ZooErr,
    arch::{NamedParams, ops},
    weights::WeightStore,
};

/// What a forward pass yields, depending on the mode and the loss.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Eval mode: the re-identification features of every sample.
    Features(Array2<f32>),
    /// Training with a softmax loss: one logit matrix per head.
    Logits(Vec<Array2<f32>>),
    /// Training with a triplet loss: the logits and the concatenated embeddings.
    LogitsAndFeatures {
        logits: Vec<Array2<f32>>,
        features: Array2<f32>,
    },
}

/// A serializable overview of a built network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub name: &'static str,
    pub family: Family,
    pub num_classes: usize,
    pub loss: Loss,
    pub device: Device,
    pub heads: usize,
    pub feature_dim: usize,
    pub num_params: usize,
    pub pretrained: bool,
}

/// A person re-identification network.
#[derive(Clone, Debug)]
pub struct ReidNet {
    blueprint: &'static Blueprint,
    backbone: Backbone,
    heads: Vec<Head>,
    num_classes: usize,
    loss: Loss,
    device: Device,
    training: bool,
    pretrained: bool,
}

impl ReidNet {
    /// Builds a network from a blueprint, the common body of every constructor.
    ///
    /// # Arguments
    /// * `blueprint` - The architecture description.
    /// * `args` - The hyperparameters.
    /// * `store` - Where pretrained checkpoints are looked up.
    ///
    /// # Returns
    /// The network in training mode, or an error if the loss is not supported by the
    /// architecture or requested pretrained weights can't be loaded.
    pub fn build(
        blueprint: &'static Blueprint,
        args: &ModelArgs,
        store: &WeightStore,
    ) -> Result<Self> {
        let name = blueprint.name;

        if !blueprint.supports(args.loss) {
            return Err(ZooErr::LossNotSupported {
                model: name,
                loss: args.loss.as_str(),
            });
        }

        let heads = blueprint.heads;
        if heads == 0 || blueprint.backbone_dim() % heads != 0 {
            return Err(ZooErr::SizeMismatch {
                what: "backbone output per head",
                got: blueprint.backbone_dim(),
                expected: heads,
            });
        }

        let mut rng = rand::rng();
        let backbone = Backbone::new(blueprint, &mut rng)?;
        let heads = (0..heads)
            .map(|_| {
                Head::new(
                    blueprint.head_input_dim(),
                    blueprint.bottleneck,
                    args.num_classes,
                    &mut rng,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let device = Device::from_flag(args.use_gpu);
        if device == Device::Gpu {
            debug!(model = name; "gpu placement requested, parameters stay in host memory");
        }

        let mut net = Self {
            blueprint,
            backbone,
            heads,
            num_classes: args.num_classes.get(),
            loss: args.loss,
            device,
            training: true,
            pretrained: false,
        };

        if args.pretrained {
            net.pretrained = store.init_pretrained(&mut net)?;
        }

        info!(
            "built {name}: {} parameters, {}-d features",
            net.num_params(),
            net.feature_dim()
        );

        Ok(net)
    }

    pub fn name(&self) -> &'static str {
        self.blueprint.name
    }

    pub fn blueprint(&self) -> &'static Blueprint {
        self.blueprint
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn loss(&self) -> Loss {
        self.loss
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Returns whether pretrained weights were loaded into the network.
    pub fn is_pretrained(&self) -> bool {
        self.pretrained
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Switches to training mode.
    pub fn train(&mut self) {
        self.training = true;
    }

    /// Switches to eval mode.
    pub fn eval(&mut self) {
        self.training = false;
    }

    /// Returns the width of the features yielded in eval mode.
    pub fn feature_dim(&self) -> usize {
        self.blueprint.feature_dim()
    }

    /// Returns the amount of trainable parameters in the network.
    pub fn num_params(&self) -> usize {
        self.backbone.size() + self.heads.iter().map(Head::size).sum::<usize>()
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            name: self.name(),
            family: self.blueprint.family,
            num_classes: self.num_classes,
            loss: self.loss,
            device: self.device,
            heads: self.heads.len(),
            feature_dim: self.feature_dim(),
            num_params: self.num_params(),
            pretrained: self.pretrained,
        }
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `images` - A `(batch, 3, height, width)` image batch.
    ///
    /// # Returns
    /// Features in eval mode, or logits (and embeddings for the triplet loss) in training mode.
    pub fn forward(&mut self, images: ArrayView4<f32>) -> Result<Output> {
        let x = self.backbone.forward(images)?;
        let chunk = x.ncols() / self.heads.len();
        let training = self.training;

        let mut features = Vec::with_capacity(self.heads.len());
        let mut logits = Vec::with_capacity(self.heads.len());

        for (i, head) in self.heads.iter_mut().enumerate() {
            let part = x.slice(s![.., i * chunk..(i + 1) * chunk]);
            let embedding = head.embed(part, training)?;

            if training {
                logits.push(head.classify(embedding.view())?);
                features.push(embedding);
                continue;
            }

            let feature = match self.blueprint.eval_features {
                EvalFeatures::Embedding => embedding,
                EvalFeatures::Pooled => part.to_owned(),
            };

            if self.blueprint.normalize {
                features.push(ops::l2_normalize(feature));
            } else {
                features.push(feature);
            }
        }

        let views: Vec<_> = features.iter().map(|f| f.view()).collect();
        let features = concatenate(Axis(1), &views)?;

        if !training {
            return Ok(Output::Features(features));
        }

        Ok(match self.loss {
            Loss::Softmax => Output::Logits(logits),
            Loss::Triplet => Output::LogitsAndFeatures { logits, features },
        })
    }

    /// Returns a view of every parameter, named as in a checkpoint.
    pub fn named_params(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        let mut out = Vec::new();
        self.backbone.params("backbone", &mut out);
        for (i, head) in self.heads.iter().enumerate() {
            head.params(&format!("heads.{i}"), &mut out);
        }

        out
    }

    /// Returns a mutable view of every parameter, named as in a checkpoint.
    pub fn named_params_mut(&mut self) -> Vec<(String, ArrayViewMutD<'_, f32>)> {
        let mut out = Vec::new();
        self.backbone.params_mut("backbone", &mut out);
        for (i, head) in self.heads.iter_mut().enumerate() {
            head.params_mut(&format!("heads.{i}"), &mut out);
        }

        out
    }
}

#[cfg(test)]
mod test {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::models::Pretrained;

    static TWO_PARTS: Blueprint = Blueprint {
        name: "two_parts",
        family: Family::Pcb,
        stages: &[8, 12],
        fuse: None,
        heads: 2,
        bottleneck: Some(4),
        eval_features: EvalFeatures::Pooled,
        normalize: true,
        losses: &[Loss::Softmax, Loss::Triplet],
        pretrained: Pretrained::Unavailable,
    };

    fn args(loss: Loss) -> ModelArgs {
        ModelArgs::new(NonZeroUsize::new(5).unwrap())
            .with_loss(loss)
            .with_pretrained(false)
            .with_gpu(false)
    }

    fn images(batch: usize) -> Array4<f32> {
        Array4::from_shape_fn((batch, 3, 8, 4), |(b, c, h, w)| {
            ((b + 1) * (c + 2) + h * w) as f32 / 32.
        })
    }

    fn store() -> WeightStore {
        WeightStore::new("/nonexistent")
    }

    #[test]
    fn softmax_training_yields_logits_per_head() {
        let mut net = ReidNet::build(&TWO_PARTS, &args(Loss::Softmax), &store()).unwrap();
        assert!(net.is_training());

        let Output::Logits(logits) = net.forward(images(3).view()).unwrap() else {
            panic!("expected logits");
        };

        assert_eq!(logits.len(), 2);
        assert!(logits.iter().all(|l| l.dim() == (3, 5)));
    }

    #[test]
    fn triplet_training_yields_logits_and_embeddings() {
        let mut net = ReidNet::build(&TWO_PARTS, &args(Loss::Triplet), &store()).unwrap();

        let Output::LogitsAndFeatures { logits, features } =
            net.forward(images(2).view()).unwrap()
        else {
            panic!("expected logits and features");
        };

        assert_eq!(logits.len(), 2);
        assert_eq!(features.dim(), (2, 8));
    }

    #[test]
    fn eval_yields_normalized_pooled_features() {
        let mut net = ReidNet::build(&TWO_PARTS, &args(Loss::Softmax), &store()).unwrap();
        net.eval();

        let Output::Features(features) = net.forward(images(4).view()).unwrap() else {
            panic!("expected features");
        };

        assert_eq!(features.dim(), (4, net.feature_dim()));
        assert_eq!(net.feature_dim(), 12);
        for row in features.rows() {
            let (left, right) = row.split_at(Axis(0), 6);
            for part in [left, right] {
                let norm = part.dot(&part).sqrt();
                assert!(norm < 1. + 1e-4);
            }
        }
    }

    #[test]
    fn unsupported_loss_is_rejected_before_allocating() {
        let softmax_only = Blueprint {
            losses: &[Loss::Softmax],
            ..TWO_PARTS
        };
        let blueprint: &'static Blueprint = Box::leak(Box::new(softmax_only));

        let err = ReidNet::build(blueprint, &args(Loss::Triplet), &store()).unwrap_err();
        assert!(matches!(
            err,
            ZooErr::LossNotSupported { model: "two_parts", loss: "triplet" }
        ));
    }

    #[test]
    fn summary_reflects_the_arguments() {
        let net = ReidNet::build(&TWO_PARTS, &args(Loss::Triplet), &store()).unwrap();
        let summary = net.summary();

        assert_eq!(summary.name, "two_parts");
        assert_eq!(summary.num_classes, 5);
        assert_eq!(summary.loss, Loss::Triplet);
        assert_eq!(summary.device, Device::Cpu);
        assert_eq!(summary.heads, 2);
        assert_eq!(summary.num_params, net.num_params());
        assert!(!summary.pretrained);
    }

    #[test]
    fn parameter_names_cover_backbone_and_heads() {
        let net = ReidNet::build(&TWO_PARTS, &args(Loss::Softmax), &store()).unwrap();
        let names: Vec<_> = net.named_params().into_iter().map(|(name, _)| name).collect();

        assert!(names.contains(&"backbone.stages.1.weight".to_string()));
        assert!(names.contains(&"heads.1.bottleneck.norm.running_var".to_string()));
        assert!(names.contains(&"heads.0.classifier.bias".to_string()));
    }
}
