use super::Relu;

#[derive(Clone, Copy, Debug)]
pub enum ActFn {
    Relu(Relu),
}

impl ActFn {
    pub fn relu() -> Self {
        Self::Relu(Relu::new())
    }

    pub fn f(&self, x: f32) -> f32 {
        match self {
            Self::Relu(a) => a.f(x),
        }
    }
}
