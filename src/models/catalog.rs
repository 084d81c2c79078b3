//! The built-in architectures: one blueprint and one constructor per architecture.
//!
//! Stage widths follow the published channel widths of each architecture, the output width of
//! the last stage is the width of its pooled feature map.

use super::{Blueprint, EvalFeatures, Family, Loss, ModelArgs, Pretrained, ReidNet};
use crate::{Result, weights::WeightStore};

const BOTH_LOSSES: &[Loss] = &[Loss::Softmax, Loss::Triplet];
const SOFTMAX_ONLY: &[Loss] = &[Loss::Softmax];

const FC512: usize = 512;
const PCB_REDUCED_DIM: usize = 256;

const RESNET_STAGES: &[usize] = &[64, 256, 512, 2048];
const DEEP_RESNET_STAGES: &[usize] = &[64, 256, 512, 1024, 2048];

const RESNET50_WEIGHTS: Pretrained = Pretrained::ImageNet {
    checkpoint: "resnet50",
    url: "https://download.pytorch.org/models/resnet50-19c8e357.pth",
};
const RESNEXT50_WEIGHTS: Pretrained = Pretrained::ImageNet {
    checkpoint: "resnext50_32x4d",
    url: "https://download.pytorch.org/models/resnext50_32x4d-7cdf4587.pth",
};
const SE_RESNET50_WEIGHTS: Pretrained = Pretrained::ImageNet {
    checkpoint: "se_resnet50",
    url: "http://data.lip6.fr/cadene/pretrainedmodels/se_resnet50-ce0d4300.pth",
};
const DENSENET121_WEIGHTS: Pretrained = Pretrained::ImageNet {
    checkpoint: "densenet121",
    url: "https://download.pytorch.org/models/densenet121-a639ec97.pth",
};
const SQUEEZENET1_0_WEIGHTS: Pretrained = Pretrained::ImageNet {
    checkpoint: "squeezenet1_0",
    url: "https://download.pytorch.org/models/squeezenet1_0-a815701f.pth",
};

/// A single-branch network whose eval features are its pooled backbone output.
const fn global(
    name: &'static str,
    family: Family,
    stages: &'static [usize],
    pretrained: Pretrained,
) -> Blueprint {
    Blueprint {
        name,
        family,
        stages,
        fuse: None,
        heads: 1,
        bottleneck: None,
        eval_features: EvalFeatures::Embedding,
        normalize: false,
        losses: BOTH_LOSSES,
        pretrained,
    }
}

/// The same network with a 512-d bottleneck in front of the classifier.
const fn fc512(name: &'static str, base: Blueprint) -> Blueprint {
    Blueprint {
        name,
        bottleneck: Some(FC512),
        ..base
    }
}

/// Part-based convolutional baseline: the feature map is split into horizontal stripes, each
/// one with its own reduction and classifier.
const fn pcb(name: &'static str, parts: usize, stages: &'static [usize]) -> Blueprint {
    Blueprint {
        name,
        family: Family::Pcb,
        stages,
        fuse: None,
        heads: parts,
        bottleneck: Some(PCB_REDUCED_DIM),
        eval_features: EvalFeatures::Pooled,
        normalize: true,
        losses: SOFTMAX_ONLY,
        pretrained: RESNET50_WEIGHTS,
    }
}

pub const RESNET50: Blueprint = global(
    "resnet50",
    Family::ResNet,
    RESNET_STAGES,
    RESNET50_WEIGHTS,
);
pub const RESNET50_FC512: Blueprint = fc512("resnet50_fc512", RESNET50);

pub const RESNEXT50_32X4D: Blueprint = global(
    "resnext50_32x4d",
    Family::ResNeXt,
    RESNET_STAGES,
    RESNEXT50_WEIGHTS,
);
pub const RESNEXT50_32X4D_FC512: Blueprint = fc512("resnext50_32x4d_fc512", RESNEXT50_32X4D);

pub const SE_RESNET50: Blueprint = global(
    "se_resnet50",
    Family::SeNet,
    RESNET_STAGES,
    SE_RESNET50_WEIGHTS,
);
pub const SE_RESNET50_FC512: Blueprint = fc512("se_resnet50_fc512", SE_RESNET50);
pub const SE_RESNET101: Blueprint = global(
    "se_resnet101",
    Family::SeNet,
    DEEP_RESNET_STAGES,
    Pretrained::ImageNet {
        checkpoint: "se_resnet101",
        url: "http://data.lip6.fr/cadene/pretrainedmodels/se_resnet101-7e38fcc6.pth",
    },
);
pub const SE_RESNEXT50_32X4D: Blueprint = global(
    "se_resnext50_32x4d",
    Family::SeNet,
    RESNET_STAGES,
    Pretrained::ImageNet {
        checkpoint: "se_resnext50_32x4d",
        url: "http://data.lip6.fr/cadene/pretrainedmodels/se_resnext50_32x4d-a260b3a4.pth",
    },
);
pub const SE_RESNEXT101_32X4D: Blueprint = global(
    "se_resnext101_32x4d",
    Family::SeNet,
    DEEP_RESNET_STAGES,
    Pretrained::ImageNet {
        checkpoint: "se_resnext101_32x4d",
        url: "http://data.lip6.fr/cadene/pretrainedmodels/se_resnext101_32x4d-3b2fe3d8.pth",
    },
);

pub const DENSENET121: Blueprint = global(
    "densenet121",
    Family::DenseNet,
    &[64, 256, 512, 1024],
    DENSENET121_WEIGHTS,
);
pub const DENSENET121_FC512: Blueprint = fc512("densenet121_fc512", DENSENET121);

pub const INCEPTIONRESNETV2: Blueprint = global(
    "inceptionresnetv2",
    Family::InceptionResNet,
    &[64, 320, 1088, 1536],
    Pretrained::ImageNet {
        checkpoint: "inceptionresnetv2",
        url: "http://data.lip6.fr/cadene/pretrainedmodels/inceptionresnetv2-520b38e4.pth",
    },
);
pub const INCEPTIONV4: Blueprint = global(
    "inceptionv4",
    Family::Inception,
    &[64, 384, 1024, 1536],
    Pretrained::ImageNet {
        checkpoint: "inceptionv4",
        url: "http://data.lip6.fr/cadene/pretrainedmodels/inceptionv4-8e4777a0.pth",
    },
);
pub const XCEPTION: Blueprint = global(
    "xception",
    Family::Xception,
    &[64, 256, 728, 2048],
    Pretrained::ImageNet {
        checkpoint: "xception",
        url: "http://data.lip6.fr/cadene/pretrainedmodels/xception-43020ad28.pth",
    },
);

pub const NASNETAMOBILE: Blueprint = global(
    "nasnetamobile",
    Family::NasNet,
    &[32, 264, 528, 1056],
    Pretrained::ImageNet {
        checkpoint: "nasnetamobile",
        url: "http://data.lip6.fr/cadene/pretrainedmodels/nasnetamobile-7e03cead.pth",
    },
);
pub const MOBILENETV2_1DOT0: Blueprint = global(
    "mobilenetv2_1dot0",
    Family::MobileNetV2,
    &[32, 96, 320, 1280],
    Pretrained::Manual {
        checkpoint: "mobilenetv2_1dot0",
        url: "https://mega.nz/#!NKp2wAIA!1NH1pbNzY_M2hVk_hdsxNM1NUOWvvGPHhaNr-fASF6c",
    },
);
pub const MOBILENETV2_1DOT4: Blueprint = global(
    "mobilenetv2_1dot4",
    Family::MobileNetV2,
    &[48, 136, 448, 1792],
    Pretrained::Manual {
        checkpoint: "mobilenetv2_1dot4",
        url: "https://mega.nz/#!RGhgEIwS!xN2s2ZdyqI6vQ3EwgmRXLEW3khr9tpXg96G9SUJugGk",
    },
);
pub const SHUFFLENET: Blueprint = global(
    "shufflenet",
    Family::ShuffleNet,
    &[24, 240, 480, 960],
    Pretrained::Manual {
        checkpoint: "shufflenet",
        url: "https://mega.nz/#!RDpUlQCY!tr_5xBEkelzDjveIYBBcGcovNCOrgfiJO9kiidz9fZM",
    },
);
pub const SQUEEZENET1_0: Blueprint = global(
    "squeezenet1_0",
    Family::SqueezeNet,
    &[96, 256, 512],
    SQUEEZENET1_0_WEIGHTS,
);
pub const SQUEEZENET1_0_FC512: Blueprint = fc512("squeezenet1_0_fc512", SQUEEZENET1_0);
pub const SQUEEZENET1_1: Blueprint = global(
    "squeezenet1_1",
    Family::SqueezeNet,
    &[64, 256, 512],
    Pretrained::ImageNet {
        checkpoint: "squeezenet1_1",
        url: "https://download.pytorch.org/models/squeezenet1_1-f364aa15.pth",
    },
);

pub const MUDEEP: Blueprint = global(
    "mudeep",
    Family::MuDeep,
    &[32, 256, 4096],
    Pretrained::Unavailable,
);

/// ResNet-50 with the mid-level features of its last block fused into the output.
pub const RESNET50MID: Blueprint = Blueprint {
    fuse: Some(1024),
    ..global("resnet50mid", Family::ResNetMid, RESNET_STAGES, RESNET50_WEIGHTS)
};

/// Harmonious attention network: a global and a local branch, each with its own classifier.
pub const HACNN: Blueprint = Blueprint {
    heads: 2,
    normalize: true,
    ..global("hacnn", Family::Hacnn, &[32, 384, 1024], Pretrained::Unavailable)
};

pub const PCB_P6: Blueprint = pcb("pcb_p6", 6, &[64, 256, 6 * 2048]);
pub const PCB_P4: Blueprint = pcb("pcb_p4", 4, &[64, 256, 4 * 2048]);

pub const MLFN: Blueprint = global(
    "mlfn",
    Family::Mlfn,
    &[64, 256, 512, 1024],
    Pretrained::Manual {
        checkpoint: "mlfn",
        url: "https://mega.nz/#!YHxAhaxC!yu9E6zWl0x5zscSouTdbZu8gdFFytDdl-RAdD2DEfpk",
    },
);

macro_rules! constructors {
    ($($(#[$meta:meta])* $name:ident => $blueprint:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(args: &ModelArgs, store: &WeightStore) -> Result<ReidNet> {
                ReidNet::build(&$blueprint, args, store)
            }
        )*
    };
}

constructors! {
    resnet50 => RESNET50,
    resnet50_fc512 => RESNET50_FC512,
    resnext50_32x4d => RESNEXT50_32X4D,
    resnext50_32x4d_fc512 => RESNEXT50_32X4D_FC512,
    se_resnet50 => SE_RESNET50,
    se_resnet50_fc512 => SE_RESNET50_FC512,
    se_resnet101 => SE_RESNET101,
    se_resnext50_32x4d => SE_RESNEXT50_32X4D,
    se_resnext101_32x4d => SE_RESNEXT101_32X4D,
    densenet121 => DENSENET121,
    densenet121_fc512 => DENSENET121_FC512,
    inceptionresnetv2 => INCEPTIONRESNETV2,
    inceptionv4 => INCEPTIONV4,
    xception => XCEPTION,
    nasnetamobile => NASNETAMOBILE,
    mobilenetv2_1dot0 => MOBILENETV2_1DOT0,
    mobilenetv2_1dot4 => MOBILENETV2_1DOT4,
    shufflenet => SHUFFLENET,
    squeezenet1_0 => SQUEEZENET1_0,
    squeezenet1_0_fc512 => SQUEEZENET1_0_FC512,
    squeezenet1_1 => SQUEEZENET1_1,
    /// Multi-scale deep learning architecture, trained from scratch.
    mudeep => MUDEEP,
    resnet50mid => RESNET50MID,
    /// Harmonious attention network, trained from scratch.
    hacnn => HACNN,
    /// Part-based convolutional baseline with six stripes, softmax loss only.
    pcb_p6 => PCB_P6,
    /// Part-based convolutional baseline with four stripes, softmax loss only.
    pcb_p4 => PCB_P4,
    mlfn => MLFN,
}
