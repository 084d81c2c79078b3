use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use ndarray::ArrayViewD;
use safetensors::{Dtype, SafeTensors, tensor::TensorView};

use crate::{
    Result, ZooErr,
    config::ZooConfig,
    models::{Pretrained, ReidNet},
};

const CHECKPOINT_EXTENSION: &str = "safetensors";

/// How many tensors of a checkpoint made it into a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Parameters overwritten with the checkpoint's values.
    pub loaded: usize,
    /// Parameters left untouched because the checkpoint lacks them or their shape differs.
    pub discarded: usize,
}

/// Resolves and reads pretrained checkpoints from a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightStore {
    dir: PathBuf,
    strict: bool,
}

impl WeightStore {
    /// Creates a new `WeightStore` rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            strict: false,
        }
    }

    pub fn from_config(config: &ZooConfig) -> Self {
        Self::new(&config.weights_dir).with_strict(config.strict_checkpoints)
    }

    /// Makes a missing ImageNet checkpoint an error instead of a warning.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns where the checkpoint named `checkpoint` is expected to be.
    pub fn checkpoint_path(&self, checkpoint: &str) -> PathBuf {
        self.dir
            .join(checkpoint)
            .with_extension(CHECKPOINT_EXTENSION)
    }

    /// Initializes a freshly built network with the pretrained weights of its architecture.
    ///
    /// # Arguments
    /// * `net` - The network to initialize.
    ///
    /// # Returns
    /// Whether any weights were loaded, or an error if a checkpoint can't be read. A missing
    /// ImageNet checkpoint is only an error for a strict store.
    pub fn init_pretrained(&self, net: &mut ReidNet) -> Result<bool> {
        let name = net.name();

        let (checkpoint, url, required) = match net.blueprint().pretrained {
            Pretrained::ImageNet { checkpoint, url } => (checkpoint, url, self.strict),
            Pretrained::Manual { checkpoint, url } => (checkpoint, url, false),
            Pretrained::Unavailable => {
                warn!("{name} has no pretrained weights, keeping the random initialization");
                return Ok(false);
            }
        };

        let path = self.checkpoint_path(checkpoint);
        if !path.is_file() {
            if required {
                return Err(ZooErr::MissingCheckpoint {
                    model: name,
                    path,
                    url,
                });
            }

            warn!(
                "no checkpoint for {name} at {}, download the weights from {url} and convert them \
                 to safetensors, keeping the random initialization",
                path.display()
            );
            return Ok(false);
        }

        let report = self.load_into(net, &path)?;
        if report.loaded == 0 {
            warn!("{} shares no tensor with {name}", path.display());
            return Ok(false);
        }

        info!(
            "initialized {name} with pretrained weights from {}",
            path.display()
        );

        Ok(true)
    }

    /// Copies every matching tensor of a checkpoint into a network.
    ///
    /// Only `F32` tensors whose name and shape match a parameter of the network are loaded, the
    /// rest of the parameters keep their current values.
    ///
    /// # Arguments
    /// * `net` - The network to overwrite.
    /// * `path` - The safetensors checkpoint.
    ///
    /// # Returns
    /// How many parameters were loaded and discarded, or an error if the file can't be read or
    /// parsed.
    pub fn load_into(&self, net: &mut ReidNet, path: &Path) -> Result<LoadReport> {
        let bytes = fs::read(path)?;
        let tensors = SafeTensors::deserialize(&bytes)?;
        let mut report = LoadReport::default();

        for (name, mut param) in net.named_params_mut() {
            let Ok(tensor) = tensors.tensor(&name) else {
                report.discarded += 1;
                continue;
            };

            if tensor.dtype() != Dtype::F32 || tensor.shape() != param.shape() {
                report.discarded += 1;
                continue;
            }

            let values: Vec<f32> = bytemuck::pod_collect_to_vec(tensor.data());
            let values = ArrayViewD::from_shape(tensor.shape(), &values)?;
            param.assign(&values);
            report.loaded += 1;
        }

        info!(
            "{} tensors loaded, {} discarded due to unmatched keys or layer size",
            report.loaded, report.discarded
        );

        Ok(report)
    }

    /// Writes every parameter of a network to a safetensors checkpoint.
    ///
    /// # Arguments
    /// * `net` - The network to save.
    /// * `path` - Where to write the checkpoint.
    pub fn save(net: &ReidNet, path: &Path) -> Result<()> {
        let params: Vec<(String, Vec<usize>, Vec<u8>)> = net
            .named_params()
            .into_iter()
            .map(|(name, view)| {
                let values: Vec<f32> = view.iter().copied().collect();
                let bytes: Vec<u8> = bytemuck::cast_slice(&values).to_vec();
                (name, view.shape().to_vec(), bytes)
            })
            .collect();

        let views = params
            .iter()
            .map(|(name, shape, bytes)| {
                Ok((name.as_str(), TensorView::new(Dtype::F32, shape.clone(), bytes)?))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let tensors = views.iter().map(|(name, view)| (*name, view));
        safetensors::serialize_to_file(tensors, &None, path)?;
        info!(
            "saved {} tensors of {} to {}",
            params.len(),
            net.name(),
            path.display()
        );

        Ok(())
    }
}
