use ndarray::Array1;

pub type Shape = Array1<usize>;

/// Working representation of a shape inside the simplifier.
pub type DimVector = Vec<usize>;

// numpy rules: shapes are aligned on their trailing axes, missing axes count as 1
pub fn broadcast_shapes(shapes: &[&Shape]) -> Option<Shape> {
    let max_rank = shapes.iter().map(|s| s.len()).max()?;
    let mut shape = Shape::ones(max_rank);
    for i in 0..max_rank {
        let dims = shapes
            .iter()
            .filter_map(|s| s.len().checked_sub(i + 1).map(|k| s[k]))
            .collect::<Vec<_>>();
        let mdim = dims.iter().copied().filter(|&d| d != 1).max().unwrap_or(1);
        if !dims.iter().all(|&d| d == mdim || d == 1) {
            return None;
        }
        shape[max_rank - 1 - i] = mdim;
    }
    Some(shape)
}

pub fn can_broadcast_to(to_shape: &Shape, from_shape: &Shape) -> bool {
    matches!(broadcast_shapes(&[to_shape, from_shape]), Some(bc_shape) if bc_shape == *to_shape)
}

pub fn numel(dims: &[usize]) -> usize {
    dims.iter().product()
}

/// Reorders `dims` so that the fastest varying axis comes first.
///
/// The merge passes only ever see shapes in this order. Every call must be
/// paired with [`to_natural_order`] before the shape leaves the simplifier.
pub(crate) fn to_fastest_first(dims: &mut DimVector) {
    dims.reverse();
}

/// Inverse of [`to_fastest_first`]: slowest varying axis first, as callers expect.
pub(crate) fn to_natural_order(dims: &mut DimVector) {
    dims.reverse();
}
