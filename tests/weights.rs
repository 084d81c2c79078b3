use std::{fs, num::NonZeroUsize};

use reid_models::{ModelArgs, Registry, WeightStore, ZooErr, registry::BUILTIN_MODELS};

fn args(num_classes: usize, pretrained: bool) -> ModelArgs {
    ModelArgs::new(NonZeroUsize::new(num_classes).unwrap())
        .with_pretrained(pretrained)
        .with_gpu(false)
}

fn param(net: &reid_models::ReidNet, name: &str) -> Vec<f32> {
    net.named_params()
        .into_iter()
        .find(|(param, _)| param == name)
        .map(|(_, view)| view.iter().copied().collect())
        .unwrap()
}

#[test]
fn exported_backbone_initializes_the_fc512_variant() {
    let dir = tempfile::tempdir().unwrap();
    let store = WeightStore::new(dir.path());
    let registry = Registry::new(BUILTIN_MODELS, store.clone());

    let source = registry.build("resnet50", &args(751, false)).unwrap();
    WeightStore::save(&source, &store.checkpoint_path("resnet50")).unwrap();

    let target = registry.build("resnet50_fc512", &args(10, true)).unwrap();

    assert!(target.is_pretrained());
    assert_eq!(
        param(&target, "backbone.stages.3.weight"),
        param(&source, "backbone.stages.3.weight")
    );
    assert_eq!(
        param(&target, "heads.0.bottleneck.norm.running_var"),
        vec![1.; 512]
    );
}

#[test]
fn load_report_counts_matched_tensors() {
    let dir = tempfile::tempdir().unwrap();
    let store = WeightStore::new(dir.path());
    let registry = Registry::new(BUILTIN_MODELS, store.clone());
    let path = dir.path().join("resnet50.safetensors");

    let source = registry.build("resnet50", &args(751, false)).unwrap();
    WeightStore::save(&source, &path).unwrap();

    let mut same = registry.build("resnet50", &args(751, false)).unwrap();
    let report = store.load_into(&mut same, &path).unwrap();
    assert_eq!(report.loaded, 10);
    assert_eq!(report.discarded, 0);
    assert_eq!(
        param(&same, "heads.0.classifier.weight"),
        param(&source, "heads.0.classifier.weight")
    );

    let mut fc512 = registry.build("resnet50_fc512", &args(10, false)).unwrap();
    let report = store.load_into(&mut fc512, &path).unwrap();
    assert_eq!(report.loaded, 8);
    assert_eq!(report.discarded, 8);
}

#[test]
fn save_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/exports/hacnn.safetensors");
    let registry = Registry::new(BUILTIN_MODELS, WeightStore::new(dir.path()));

    let net = registry.build("hacnn", &args(4, false)).unwrap();
    WeightStore::save(&net, &path).unwrap();

    assert!(path.is_file());
}

#[test]
fn corrupt_checkpoints_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = WeightStore::new(dir.path());
    fs::write(store.checkpoint_path("densenet121"), b"not a checkpoint").unwrap();

    let registry = Registry::new(BUILTIN_MODELS, store);
    let err = registry.build("densenet121", &args(4, true)).unwrap_err();

    assert!(matches!(err, ZooErr::Checkpoint(_)));
}

#[test]
fn manual_checkpoints_are_loaded_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let store = WeightStore::new(dir.path());
    let registry = Registry::new(BUILTIN_MODELS, store.clone());

    let source = registry.build("mlfn", &args(10, false)).unwrap();
    WeightStore::save(&source, &store.checkpoint_path("mlfn")).unwrap();

    let target = registry.build("mlfn", &args(10, true)).unwrap();
    assert!(target.is_pretrained());
    assert_eq!(
        param(&target, "backbone.stages.0.bias"),
        param(&source, "backbone.stages.0.bias")
    );
}

#[test]
fn checkpoints_sharing_no_tensor_leave_the_network_untrained() {
    let dir = tempfile::tempdir().unwrap();
    let store = WeightStore::new(dir.path());
    let registry = Registry::new(BUILTIN_MODELS, store.clone());

    let other = registry.build("hacnn", &args(4, false)).unwrap();
    WeightStore::save(&other, &store.checkpoint_path("mlfn")).unwrap();

    let net = registry.build("mlfn", &args(10, true)).unwrap();
    assert!(!net.is_pretrained());
}
