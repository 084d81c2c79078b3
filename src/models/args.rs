use std::{fmt, num::NonZeroUsize, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ZooErr;

/// The training objective a network's output is shaped for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    /// Identity classification, the network yields logits while training.
    #[default]
    Softmax,
    /// Metric learning, the network yields logits and embeddings while training.
    Triplet,
}

impl Loss {
    pub fn as_str(&self) -> &'static str {
        match self {
            Loss::Softmax => "softmax",
            Loss::Triplet => "triplet",
        }
    }
}

impl FromStr for Loss {
    type Err = ZooErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "softmax" => Ok(Loss::Softmax),
            "triplet" => Ok(Loss::Triplet),
            other => Err(ZooErr::UnsupportedLoss {
                loss: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a network's tensors are meant to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Cpu,
    Gpu,
}

impl Device {
    pub fn from_flag(use_gpu: bool) -> Self {
        if use_gpu { Device::Gpu } else { Device::Cpu }
    }
}

/// The hyperparameters every constructor receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArgs {
    /// The number of training identities.
    pub num_classes: NonZeroUsize,
    pub loss: Loss,
    /// Whether to start from ImageNet-pretrained weights.
    pub pretrained: bool,
    pub use_gpu: bool,
}

impl ModelArgs {
    /// Creates a new `ModelArgs` with a softmax loss, pretrained weights and gpu placement.
    pub fn new(num_classes: NonZeroUsize) -> Self {
        Self {
            num_classes,
            loss: Loss::default(),
            pretrained: true,
            use_gpu: true,
        }
    }

    /// Validates untyped arguments.
    ///
    /// # Returns
    /// An error if `num_classes` is zero or `loss` is neither `"softmax"` nor `"triplet"`.
    pub fn parse(
        num_classes: usize,
        loss: &str,
        pretrained: bool,
        use_gpu: bool,
    ) -> crate::Result<Self> {
        let num_classes = NonZeroUsize::new(num_classes).ok_or(ZooErr::InvalidNumClasses)?;

        Ok(Self {
            num_classes,
            loss: loss.parse()?,
            pretrained,
            use_gpu,
        })
    }

    pub fn with_loss(mut self, loss: Loss) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_pretrained(mut self, pretrained: bool) -> Self {
        self.pretrained = pretrained;
        self
    }

    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn loss_parsing_is_case_sensitive() {
        assert_eq!("softmax".parse::<Loss>().unwrap(), Loss::Softmax);
        assert_eq!("triplet".parse::<Loss>().unwrap(), Loss::Triplet);
        assert!(matches!(
            "Softmax".parse::<Loss>(),
            Err(ZooErr::UnsupportedLoss { loss }) if loss == "Softmax"
        ));
    }

    #[test]
    fn defaults_match_the_factory_signature() {
        let args = ModelArgs::new(NonZeroUsize::new(751).unwrap());

        assert_eq!(args.loss, Loss::Softmax);
        assert!(args.pretrained);
        assert!(args.use_gpu);
    }

    #[test]
    fn parse_rejects_zero_classes() {
        assert!(matches!(
            ModelArgs::parse(0, "softmax", true, true),
            Err(ZooErr::InvalidNumClasses)
        ));

        let args = ModelArgs::parse(10, "triplet", false, false).unwrap();
        assert_eq!(args.num_classes.get(), 10);
        assert_eq!(args.loss, Loss::Triplet);
        assert_eq!(Device::from_flag(args.use_gpu), Device::Cpu);
    }
}
