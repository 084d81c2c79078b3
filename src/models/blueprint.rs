use serde::Serialize;

use super::Loss;

/// The architecture family a blueprint stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    ResNet,
    ResNeXt,
    SeNet,
    DenseNet,
    InceptionResNet,
    Inception,
    Xception,
    NasNet,
    MobileNetV2,
    ShuffleNet,
    SqueezeNet,
    MuDeep,
    ResNetMid,
    Hacnn,
    Pcb,
    Mlfn,
}

/// Where the pretrained weights of an architecture come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pretrained {
    /// Published ImageNet weights, the checkpoint must be present when requested.
    ImageNet {
        checkpoint: &'static str,
        url: &'static str,
    },
    /// Weights that have to be fetched by hand, loaded only if present.
    Manual {
        checkpoint: &'static str,
        url: &'static str,
    },
    /// The architecture is always trained from scratch.
    Unavailable,
}

/// Which tensor of a head the eval-mode features are taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalFeatures {
    /// The head's embedding, after the bottleneck if there is one.
    Embedding,
    /// The head's slice of the backbone output, before the bottleneck.
    Pooled,
}

/// The static description of an architecture: everything a constructor needs besides the
/// hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct Blueprint {
    pub name: &'static str,
    pub family: Family,
    /// Widths of the backbone stages, the last one is the backbone's output width unless
    /// `fuse` adds to it.
    pub stages: &'static [usize],
    /// Width of the mid-level branch fused after the last stage.
    pub fuse: Option<usize>,
    /// Amount of heads the backbone output is split into.
    pub heads: usize,
    /// Width of the per-head bottleneck.
    pub bottleneck: Option<usize>,
    pub eval_features: EvalFeatures,
    /// Whether eval features get L2-normalized per head.
    pub normalize: bool,
    pub losses: &'static [Loss],
    pub pretrained: Pretrained,
}

impl Blueprint {
    /// Returns the width of the backbone output.
    pub fn backbone_dim(&self) -> usize {
        self.stages.last().copied().unwrap_or(0) + self.fuse.unwrap_or(0)
    }

    /// Returns the width of the input each head receives.
    pub fn head_input_dim(&self) -> usize {
        self.backbone_dim() / self.heads.max(1)
    }

    /// Returns the width of each head's embedding.
    pub fn embedding_dim(&self) -> usize {
        self.bottleneck.unwrap_or_else(|| self.head_input_dim())
    }

    /// Returns the width of the features the network yields in eval mode.
    pub fn feature_dim(&self) -> usize {
        let per_head = match self.eval_features {
            EvalFeatures::Embedding => self.embedding_dim(),
            EvalFeatures::Pooled => self.head_input_dim(),
        };

        per_head * self.heads
    }

    /// Returns whether the architecture can be trained with `loss`.
    pub fn supports(&self, loss: Loss) -> bool {
        self.losses.contains(&loss)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PARTS: Blueprint = Blueprint {
        name: "parts",
        family: Family::Pcb,
        stages: &[8, 24],
        fuse: None,
        heads: 3,
        bottleneck: Some(4),
        eval_features: EvalFeatures::Pooled,
        normalize: true,
        losses: &[Loss::Softmax],
        pretrained: Pretrained::Unavailable,
    };

    #[test]
    fn dimensions_follow_the_head_layout() {
        assert_eq!(PARTS.backbone_dim(), 24);
        assert_eq!(PARTS.head_input_dim(), 8);
        assert_eq!(PARTS.embedding_dim(), 4);
        assert_eq!(PARTS.feature_dim(), 24);

        let embedded = Blueprint {
            eval_features: EvalFeatures::Embedding,
            ..PARTS
        };
        assert_eq!(embedded.feature_dim(), 12);

        let fused = Blueprint {
            fuse: Some(6),
            heads: 1,
            bottleneck: None,
            ..PARTS
        };
        assert_eq!(fused.backbone_dim(), 30);
        assert_eq!(fused.feature_dim(), 30);
    }

    #[test]
    fn supported_losses_are_checked() {
        assert!(PARTS.supports(Loss::Softmax));
        assert!(!PARTS.supports(Loss::Triplet));
    }
}
