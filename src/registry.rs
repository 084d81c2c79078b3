use log::info;

use crate::{
    Result, ZooErr,
    config::ZooConfig,
    models::{ModelArgs, ReidNet, catalog},
    weights::WeightStore,
};

/// Signature shared by every architecture constructor.
pub type BuildFn = fn(&ModelArgs, &WeightStore) -> Result<ReidNet>;

/// A registered architecture.
#[derive(Clone, Copy)]
pub struct ModelEntry {
    pub name: &'static str,
    pub build: BuildFn,
}

const fn entry(name: &'static str, build: BuildFn) -> ModelEntry {
    ModelEntry { name, build }
}

/// The built-in architectures, in the order they are listed.
pub static BUILTIN_MODELS: &[ModelEntry] = &[
    // image classification models
    entry("resnet50", catalog::resnet50),
    entry("resnet50_fc512", catalog::resnet50_fc512),
    entry("resnext50_32x4d", catalog::resnext50_32x4d),
    entry("resnext50_32x4d_fc512", catalog::resnext50_32x4d_fc512),
    entry("se_resnet50", catalog::se_resnet50),
    entry("se_resnet50_fc512", catalog::se_resnet50_fc512),
    entry("se_resnet101", catalog::se_resnet101),
    entry("se_resnext50_32x4d", catalog::se_resnext50_32x4d),
    entry("se_resnext101_32x4d", catalog::se_resnext101_32x4d),
    entry("densenet121", catalog::densenet121),
    entry("densenet121_fc512", catalog::densenet121_fc512),
    entry("inceptionresnetv2", catalog::inceptionresnetv2),
    entry("inceptionv4", catalog::inceptionv4),
    entry("xception", catalog::xception),
    // lightweight models
    entry("nasnsetmobile", catalog::nasnetamobile),
    entry("mobilenetv2_1dot0", catalog::mobilenetv2_1dot0),
    entry("mobilenetv2_1dot4", catalog::mobilenetv2_1dot4),
    entry("shufflenet", catalog::shufflenet),
    entry("squeezenet1_0", catalog::squeezenet1_0),
    entry("squeezenet1_0_fc512", catalog::squeezenet1_0_fc512),
    entry("squeezenet1_1", catalog::squeezenet1_1),
    // reid-specific models
    entry("mudeep", catalog::mudeep),
    entry("resnet50mid", catalog::resnet50mid),
    entry("hacnn", catalog::hacnn),
    entry("pcb_p6", catalog::pcb_p6),
    entry("pcb_p4", catalog::pcb_p4),
    entry("mlfn", catalog::mlfn),
];

/// Dispatches architecture names to their constructors.
#[derive(Clone)]
pub struct Registry {
    entries: &'static [ModelEntry],
    store: WeightStore,
}

impl Registry {
    /// Creates a new `Registry` over `entries`, resolving checkpoints through `store`.
    pub fn new(entries: &'static [ModelEntry], store: WeightStore) -> Self {
        Self { entries, store }
    }

    /// The registry of the built-in architectures, configured from the environment.
    pub fn builtin() -> Self {
        let config = ZooConfig::from_env();
        Self::new(BUILTIN_MODELS, WeightStore::from_config(&config))
    }

    pub fn store(&self) -> &WeightStore {
        &self.store
    }

    /// Returns every registered name, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.name).collect()
    }

    /// Finds the constructor registered as `name`.
    ///
    /// # Errors
    /// `ZooErr::UnknownModel` listing every registered name if there is none.
    pub fn lookup(&self, name: &str) -> Result<&ModelEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| ZooErr::UnknownModel {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Builds the architecture registered as `name`.
    ///
    /// # Arguments
    /// * `name` - The exact, case-sensitive name of the architecture.
    /// * `args` - Forwarded untouched to the constructor.
    ///
    /// # Returns
    /// The freshly built network, or an error if the name is unknown or the constructor fails.
    pub fn build(&self, name: &str, args: &ModelArgs) -> Result<ReidNet> {
        let entry = self.lookup(name)?;
        Self::invoke(entry, args, &self.store)
    }

    /// Builds the architecture registered as `name` from untyped arguments.
    ///
    /// The name is looked up before the remaining arguments are validated.
    ///
    /// # Arguments
    /// * `name` - The exact, case-sensitive name of the architecture.
    /// * `num_classes` - The number of training identities, must be positive.
    /// * `loss` - Either `"softmax"` or `"triplet"`.
    /// * `pretrained` - Whether to start from pretrained weights.
    /// * `use_gpu` - Whether the network is meant for gpu placement.
    ///
    /// # Returns
    /// The freshly built network, or an error if the name is unknown, an argument is invalid or
    /// the constructor fails.
    pub fn build_with(
        &self,
        name: &str,
        num_classes: usize,
        loss: &str,
        pretrained: bool,
        use_gpu: bool,
    ) -> Result<ReidNet> {
        let entry = self.lookup(name)?;
        let args = ModelArgs::parse(num_classes, loss, pretrained, use_gpu)?;
        Self::invoke(entry, &args, &self.store)
    }

    fn invoke(entry: &ModelEntry, args: &ModelArgs, store: &WeightStore) -> Result<ReidNet> {
        info!("initializing model: {}", entry.name);
        (entry.build)(args, store)
    }
}

/// Returns the names of the built-in architectures.
pub fn list_available_models() -> Vec<&'static str> {
    BUILTIN_MODELS.iter().map(|entry| entry.name).collect()
}

/// Prints the names of the built-in architectures, one per line.
pub fn show_available_models() {
    for name in list_available_models() {
        println!("{name}");
    }
}

/// Builds a built-in architecture from untyped arguments, see [`Registry::build_with`].
pub fn build_model(
    name: &str,
    num_classes: usize,
    loss: &str,
    pretrained: bool,
    use_gpu: bool,
) -> Result<ReidNet> {
    Registry::builtin().build_with(name, num_classes, loss, pretrained, use_gpu)
}
