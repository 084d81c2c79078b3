use ndarray::{ArrayViewD, ArrayViewMutD};

/// Exposes the trainable tensors of a component under dotted names, the way they are laid out in
/// a checkpoint.
pub trait NamedParams {
    /// Appends a view of every parameter, named `{prefix}.{tensor}`.
    fn params<'a>(&'a self, prefix: &str, out: &mut Vec<(String, ArrayViewD<'a, f32>)>);

    /// Appends a mutable view of every parameter, named `{prefix}.{tensor}`.
    fn params_mut<'a>(&'a mut self, prefix: &str, out: &mut Vec<(String, ArrayViewMutD<'a, f32>)>);
}
