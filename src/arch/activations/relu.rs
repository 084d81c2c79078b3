/// Rectified linear unit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Relu;

impl Relu {
    pub fn new() -> Self {
        Self
    }

    pub fn f(&self, z: f32) -> f32 {
        z.max(0.)
    }
}
