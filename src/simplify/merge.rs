use log::debug;

use super::{shape::DimVector, BroadcastDimsSimplifier};

/// Decides whether an axis may join the run of axes currently being fused.
///
/// Both variants read the shapes in fastest-first order and treat
/// `in_dims[0]` as the reference input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePredicate {
    /// Every input has the same size as the first input on this axis.
    ///
    /// ```text
    /// in_1 = [2, 3, 4, 5]    in_1 = [2, 12, 5]
    /// in_2 = [1, 3, 4, 5] -> in_2 = [1, 12, 5]
    /// in_3 = [2, 3, 4, 1]    in_3 = [2, 12, 1]
    /// ```
    SequentialEqual,
    /// The first input broadcasts (size 1) while every other input carries
    /// the full output size.
    ///
    /// ```text
    /// in_1 = [2, 1, 1, 5]    in_1 = [2,  1, 5]
    /// in_2 = [2, 3, 4, 5] -> in_2 = [2, 12, 5]
    /// in_3 = [2, 3, 4, 1]    in_3 = [2, 12, 1]
    /// ```
    SequentialOne,
}

impl MergePredicate {
    pub fn is_run_extendable(&self, in_dims: &[DimVector], out_dims: &[usize], axis: usize) -> bool {
        let (reference, others) = match in_dims.split_first() {
            Some(split) => split,
            None => return false,
        };
        match self {
            MergePredicate::SequentialEqual => others.iter().all(|dims| dims[axis] == reference[axis]),
            MergePredicate::SequentialOne => {
                reference[axis] == 1 && others.iter().all(|dims| dims[axis] == out_dims[axis])
            }
        }
    }
}

// replace axes start..end by a single axis holding their product
fn fuse_axes(dims: &mut DimVector, start: usize, end: usize) {
    let fused = dims[start..end].iter().product();
    dims.splice(start..end, std::iter::once(fused));
}

// length of the longest run of consecutive size-1 axes
fn longest_one_run(dims: &[usize]) -> usize {
    dims.iter()
        .fold((0, 0), |(longest, current), &d| {
            if d == 1 {
                (longest.max(current + 1), current + 1)
            } else {
                (longest, 0)
            }
        })
        .0
}

impl BroadcastDimsSimplifier {
    /// Sweeps the axes once from the fastest varying end, fusing every run
    /// of more than one axis accepted by `predicate` in all inputs and in
    /// the output. Returns the number of axes removed.
    pub(super) fn merge_dimensions(&mut self, predicate: MergePredicate) -> usize {
        let initial_rank = self.rank;
        let mut i = 0;
        while i < self.rank {
            let start = i;
            while i < self.rank && predicate.is_run_extendable(&self.in_dims, &self.out_dims, i) {
                i += 1;
            }
            let len = i - start;
            if len > 1 {
                for dims in self.in_dims.iter_mut() {
                    fuse_axes(dims, start, i);
                }
                fuse_axes(&mut self.out_dims, start, i);
                self.rank -= len - 1;
                debug!(
                    "{:?}: fused axes {}..{} into {}, rank is now {}",
                    predicate, start, i, self.out_dims[start], self.rank
                );
                i = start + 1;
            } else if len == 0 {
                i += 1;
            }
        }
        initial_rank - self.rank
    }

    /// Index of the input with the strictly longest run of size-1 axes, if
    /// that run is longer than one axis. Ties keep the earliest input.
    pub(super) fn find_sequential_one_dim(&self) -> Option<usize> {
        let mut index = 0;
        let mut max_one_length = 0;
        for (j, dims) in self.in_dims.iter().enumerate() {
            let seq_one_length = longest_one_run(dims);
            if seq_one_length > max_one_length {
                index = j;
                max_one_length = seq_one_length;
            }
        }
        (max_one_length > 1).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // shapes are given fastest-first, as the merge passes see them
    fn state(in_dims: Vec<DimVector>, out_dims: DimVector) -> BroadcastDimsSimplifier {
        BroadcastDimsSimplifier::from_fastest_first(in_dims, out_dims)
    }

    #[test]
    fn sequential_equal_predicate() {
        let in_dims = vec![vec![5, 4, 3, 2], vec![5, 4, 3, 1], vec![1, 4, 3, 2]];
        let out = vec![5, 4, 3, 2];
        let p = MergePredicate::SequentialEqual;
        assert!(!p.is_run_extendable(&in_dims, &out, 0));
        assert!(p.is_run_extendable(&in_dims, &out, 1));
        assert!(p.is_run_extendable(&in_dims, &out, 2));
        assert!(!p.is_run_extendable(&in_dims, &out, 3));
    }

    #[test]
    fn sequential_one_predicate() {
        let in_dims = vec![vec![5, 1, 1, 2], vec![5, 4, 3, 2], vec![1, 4, 3, 2]];
        let out = vec![5, 4, 3, 2];
        let p = MergePredicate::SequentialOne;
        assert!(!p.is_run_extendable(&in_dims, &out, 0));
        assert!(p.is_run_extendable(&in_dims, &out, 1));
        assert!(p.is_run_extendable(&in_dims, &out, 2));
        assert!(!p.is_run_extendable(&in_dims, &out, 3));
    }

    #[test]
    fn equal_sweep_fuses_middle_run() {
        let mut s = state(
            vec![vec![5, 4, 3, 2], vec![5, 4, 3, 1], vec![1, 4, 3, 2]],
            vec![5, 4, 3, 2],
        );
        assert_eq!(s.merge_dimensions(MergePredicate::SequentialEqual), 1);
        assert_eq!(s.rank, 3);
        assert_eq!(s.in_dims, vec![vec![5, 12, 2], vec![5, 12, 1], vec![1, 12, 2]]);
        assert_eq!(s.out_dims, vec![5, 12, 2]);
    }

    #[test]
    fn equal_sweep_fuses_several_runs() {
        let mut s = state(
            vec![vec![2, 3, 1, 4, 5], vec![2, 3, 7, 4, 5]],
            vec![2, 3, 7, 4, 5],
        );
        assert_eq!(s.merge_dimensions(MergePredicate::SequentialEqual), 2);
        assert_eq!(s.in_dims, vec![vec![6, 1, 20], vec![6, 7, 20]]);
        assert_eq!(s.out_dims, vec![6, 7, 20]);
    }

    #[test]
    fn one_sweep_needs_broadcaster_first() {
        let mut s = state(
            vec![vec![5, 4, 3, 2], vec![5, 1, 1, 2], vec![1, 4, 3, 2]],
            vec![5, 4, 3, 2],
        );
        assert_eq!(s.merge_dimensions(MergePredicate::SequentialOne), 0);
        s.in_dims.swap(0, 1);
        assert_eq!(s.merge_dimensions(MergePredicate::SequentialOne), 1);
        assert_eq!(s.in_dims[0], vec![5, 1, 2]);
        assert_eq!(s.in_dims[1], vec![5, 12, 2]);
        assert_eq!(s.in_dims[2], vec![1, 12, 2]);
    }

    #[test]
    fn longest_run_of_ones() {
        assert_eq!(longest_one_run(&[]), 0);
        assert_eq!(longest_one_run(&[2, 3]), 0);
        assert_eq!(longest_one_run(&[1, 1, 1, 4, 1, 1]), 3);
        assert_eq!(longest_one_run(&[1, 4, 1, 1]), 2);
    }

    #[test]
    fn find_sequential_one_dim_keeps_first_on_tie() {
        let s = state(
            vec![vec![5, 4, 3], vec![1, 1, 3], vec![5, 1, 1]],
            vec![5, 4, 3],
        );
        assert_eq!(s.find_sequential_one_dim(), Some(1));
    }

    #[test]
    fn find_sequential_one_dim_needs_run_longer_than_one() {
        let s = state(vec![vec![1, 4, 1], vec![5, 4, 3]], vec![5, 4, 3]);
        assert_eq!(s.find_sequential_one_dim(), None);
    }
}
