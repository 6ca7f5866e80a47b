use super::{shape::numel, SimplifiedDims};

// Strides and offsets for a kernel walking the output with one linear index.
// Input strides are row major over each input's own (reduced) shape, with a
// zero stride wherever the input broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastIndexer {
    out_dims: Vec<usize>,
    out_strides: Vec<usize>,
    in_strides: Vec<Vec<usize>>,
}

impl BroadcastIndexer {
    pub fn new(dims: &SimplifiedDims) -> Self {
        let out_dims = dims.out_dims().to_vec();
        let in_strides = dims
            .in_dims()
            .iter()
            .map(|in_dim| Self::broadcast_strides(&in_dim.to_vec()))
            .collect();
        Self {
            out_strides: Self::contiguous_strides(&out_dims),
            out_dims,
            in_strides,
        }
    }

    // row major order
    fn contiguous_strides(dims: &[usize]) -> Vec<usize> {
        let mut strides = vec![0; dims.len()];
        let mut stride = 1;
        for i in (0..dims.len()).rev() {
            strides[i] = stride;
            stride *= dims[i];
        }
        strides
    }

    fn broadcast_strides(in_dim: &[usize]) -> Vec<usize> {
        Self::contiguous_strides(in_dim)
            .into_iter()
            .zip(in_dim)
            .map(|(stride, &d)| if d == 1 { 0 } else { stride })
            .collect()
    }

    pub fn rank(&self) -> usize {
        self.out_dims.len()
    }

    pub fn numel(&self) -> usize {
        numel(&self.out_dims)
    }

    pub fn out_strides(&self) -> &[usize] {
        &self.out_strides
    }

    pub fn in_strides(&self, j: usize) -> &[usize] {
        &self.in_strides[j]
    }

    // row major order
    pub fn unravel(&self, linear: usize) -> Vec<usize> {
        let mut idx = linear;
        let mut res = vec![0; self.rank()];
        for i in (0..self.rank()).rev() {
            res[i] = idx % self.out_dims[i];
            idx /= self.out_dims[i];
        }
        res
    }

    /// Element offset into input `j` for the output element at `linear`.
    pub fn input_offset(&self, j: usize, linear: usize) -> usize {
        let strides = &self.in_strides[j];
        let mut idx = linear;
        let mut offset = 0;
        for i in (0..self.rank()).rev() {
            offset += (idx % self.out_dims[i]) * strides[i];
            idx /= self.out_dims[i];
        }
        offset
    }

    pub fn offsets(&self, linear: usize) -> Vec<usize> {
        (0..self.in_strides.len())
            .map(|j| self.input_offset(j, linear))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simplify::{simplify, Alignment};
    use ndarray::array;

    #[test]
    fn strides_of_reduced_shapes() {
        let dims = simplify(
            &[array![2, 1, 1, 5], array![2, 3, 4, 5], array![2, 3, 4, 1]],
            &array![2, 3, 4, 5],
            Alignment::Axis(0),
        )
        .unwrap();
        let indexer = BroadcastIndexer::new(&dims);
        assert_eq!(indexer.rank(), 3);
        assert_eq!(indexer.numel(), 120);
        assert_eq!(indexer.out_strides(), &[60, 5, 1]);
        assert_eq!(indexer.in_strides(0), &[5, 0, 1]);
        assert_eq!(indexer.in_strides(1), &[60, 5, 1]);
        assert_eq!(indexer.in_strides(2), &[12, 1, 0]);
    }

    #[test]
    fn offsets_follow_broadcast() {
        let dims = simplify(&[array![3, 1], array![2, 1, 4]], &array![2, 3, 4], Alignment::Trailing).unwrap();
        let indexer = BroadcastIndexer::new(&dims);
        // output element (1, 2, 3)
        let linear = 12 + 2 * 4 + 3;
        assert_eq!(indexer.unravel(linear), vec![1, 2, 3]);
        assert_eq!(indexer.offsets(linear), vec![2, 7]);
    }

    #[test]
    fn flat_when_no_broadcast() {
        let a = array![2, 3];
        let dims = simplify(&[a.clone(), a.clone()], &a, Alignment::Trailing).unwrap();
        let indexer = BroadcastIndexer::new(&dims);
        assert_eq!(indexer.rank(), 1);
        assert_eq!(indexer.offsets(5), vec![5, 5]);
    }
}
