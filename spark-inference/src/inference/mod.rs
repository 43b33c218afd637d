use ndarray::{Array2, ArrayView2};

pub mod sam;

/// Bilinear resize with corner alignment. `new_shape` is `(height, width)`.
pub(crate) fn linear_interpolate(input: ArrayView2<f32>, new_shape: (usize, usize)) -> Array2<f32> {
    let (old_height, old_width) = input.dim();
    let (new_height, new_width) = new_shape;
    if old_height == 0 || old_width == 0 {
        return Array2::zeros(new_shape);
    }

    let step = |old: usize, new: usize| {
        if new > 1 {
            (old as f32 - 1.0) / (new as f32 - 1.0)
        } else {
            0.0
        }
    };
    let (step_y, step_x) = (step(old_height, new_height), step(old_width, new_width));

    Array2::from_shape_fn(new_shape, |(i, j)| {
        let x = j as f32 * step_x;
        let y = i as f32 * step_y;

        let x0 = x.floor() as usize;
        let x1 = (x0 + 1).min(old_width - 1);
        let y0 = y.floor() as usize;
        let y1 = (y0 + 1).min(old_height - 1);

        let p00 = input[[y0, x0]];
        let p01 = input[[y0, x1]];
        let p10 = input[[y1, x0]];
        let p11 = input[[y1, x1]];

        let dx = x - x0 as f32;
        let dy = y - y0 as f32;

        p00 * (1.0 - dx) * (1.0 - dy) + p01 * dx * (1.0 - dy) + p10 * (1.0 - dx) * dy + p11 * dx * dy
    })
}
