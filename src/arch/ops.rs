use ndarray::prelude::*;

use crate::{Result, ZooErr};

const NORM_EPSILON: f32 = 1e-12;

/// Averages every channel of a `(batch, channels, height, width)` image batch over its spatial
/// dimensions.
///
/// # Returns
/// A `(batch, channels)` matrix or an error if any dimension is empty.
pub fn global_avg_pool(images: ArrayView4<f32>) -> Result<Array2<f32>> {
    let (batch, channels, height, width) = images.dim();
    if batch == 0 || channels == 0 || height == 0 || width == 0 {
        return Err(ZooErr::EmptyInput);
    }

    images
        .mean_axis(Axis(3))
        .and_then(|rows| rows.mean_axis(Axis(2)))
        .ok_or(ZooErr::EmptyInput)
}

/// Scales every row of `x` to unit L2 norm.
pub fn l2_normalize(mut x: Array2<f32>) -> Array2<f32> {
    for mut row in x.rows_mut() {
        let norm = row.dot(&row).sqrt().max(NORM_EPSILON);
        row /= norm;
    }

    x
}
