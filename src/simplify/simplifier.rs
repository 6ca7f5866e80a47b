use anyhow::Result;
use itertools::Itertools;
use log::{debug, log_enabled, Level};
use std::fmt;

use super::{
    error::InvalidArgument,
    extend::extend_dims,
    merge::MergePredicate,
    shape::{broadcast_shapes, to_fastest_first, to_natural_order, DimVector, Shape},
};

/// Where a lower-rank input starts on the output axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Line the last input axis up with the last output axis.
    #[default]
    Trailing,
    /// The first input axis lines up with this output axis.
    Axis(usize),
}

impl Alignment {
    /// Frameworks usually pass `-1` for trailing alignment.
    pub fn from_signed(axis: isize) -> Self {
        match usize::try_from(axis) {
            Ok(axis) => Alignment::Axis(axis),
            Err(_) => Alignment::Trailing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplifyOptions {
    pub alignment: Alignment,
    /// Run the size-1 run merges after the equal-size merge.
    pub merge_one_dims: bool,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            alignment: Alignment::Trailing,
            merge_one_dims: true,
        }
    }
}

/// Working state of one simplification.
///
/// Between construction and [`BroadcastDimsSimplifier::into_simplified`] all
/// shapes are held fastest-first. `in_dims` may hold one trailing virtual
/// participant equal to the output, which never leaves this type.
#[derive(Debug, Clone)]
pub struct BroadcastDimsSimplifier {
    pub(super) rank: usize,
    pub(super) out_dims: DimVector,
    pub(super) in_dims: Vec<DimVector>,
    n_inputs: usize,
}

impl BroadcastDimsSimplifier {
    pub fn new(inputs: &[Shape], out: &Shape, options: &SimplifyOptions) -> Result<Self> {
        if inputs.is_empty() {
            return Err(InvalidArgument::NoInputs.into());
        }
        let n_inputs = inputs.len();
        if !Self::need_broadcast(inputs, out) {
            let numel = out.iter().product::<usize>();
            debug!("no broadcast needed, flattening {} inputs to [{}]", n_inputs, numel);
            return Ok(Self {
                rank: 1,
                out_dims: vec![numel],
                in_dims: vec![vec![numel]; n_inputs],
                n_inputs,
            });
        }

        let out_dims = out.to_vec();
        let mut in_dims = inputs
            .iter()
            .map(|in_dim| extend_dims(&in_dim.to_vec(), &out_dims, options.alignment))
            .collect::<Result<Vec<_>>>()?;

        // A single input is broadcast against the output itself. With several
        // inputs the output joins as well when it is wider than all of them on
        // some axis, so an all-ones axis is never fused with an all-full one.
        if n_inputs == 1 || Self::output_is_wider(&in_dims, &out_dims) {
            debug!("adding output {:?} as a virtual input", out_dims);
            in_dims.push(out_dims.clone());
        }

        let mut simplifier = Self::from_natural_order(in_dims, out_dims, n_inputs);
        simplifier.simplify(options);
        Ok(simplifier)
    }

    fn from_natural_order(mut in_dims: Vec<DimVector>, mut out_dims: DimVector, n_inputs: usize) -> Self {
        in_dims.iter_mut().for_each(to_fastest_first);
        to_fastest_first(&mut out_dims);
        Self {
            rank: out_dims.len(),
            out_dims,
            in_dims,
            n_inputs,
        }
    }

    #[cfg(test)]
    pub(super) fn from_fastest_first(in_dims: Vec<DimVector>, out_dims: DimVector) -> Self {
        Self {
            rank: out_dims.len(),
            n_inputs: in_dims.len(),
            out_dims,
            in_dims,
        }
    }

    fn need_broadcast(inputs: &[Shape], out: &Shape) -> bool {
        let first = &inputs[0];
        !(inputs.iter().all(|in_dim| in_dim == first) && out == first)
    }

    fn output_is_wider(in_dims: &[DimVector], out_dims: &[usize]) -> bool {
        (0..out_dims.len()).any(|i| out_dims[i] != 1 && in_dims.iter().all(|dims| dims[i] == 1))
    }

    fn simplify(&mut self, options: &SimplifyOptions) {
        self.merge_dimensions(MergePredicate::SequentialEqual);
        if options.merge_one_dims {
            let mut i = 0;
            while i < self.rank {
                let Some(swap_idx) = self.find_sequential_one_dim() else {
                    break;
                };
                debug!("input {} broadcasts over the longest run of ones", swap_idx);
                self.in_dims.swap(0, swap_idx);
                self.merge_dimensions(MergePredicate::SequentialOne);
                self.in_dims.swap(0, swap_idx);
                i += 1;
            }
        }
        if log_enabled!(Level::Debug) {
            debug!(
                "simplified to rank {}: out {:?} <- [{}]",
                self.rank,
                self.out_dims,
                self.in_dims[..self.n_inputs]
                    .iter()
                    .map(|dims| format!("{:?}", dims))
                    .join(", ")
            );
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Drops any virtual input and returns the shapes in natural order.
    pub fn into_simplified(self) -> SimplifiedDims {
        let Self {
            mut out_dims,
            mut in_dims,
            n_inputs,
            ..
        } = self;
        in_dims.truncate(n_inputs);
        to_natural_order(&mut out_dims);
        SimplifiedDims {
            out_dims: Shape::from(out_dims),
            in_dims: in_dims
                .into_iter()
                .map(|mut dims| {
                    to_natural_order(&mut dims);
                    Shape::from(dims)
                })
                .collect(),
        }
    }
}

/// Reduced shapes handed to a broadcasting kernel, in natural axis order.
/// Every input has the same rank as the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifiedDims {
    out_dims: Shape,
    in_dims: Vec<Shape>,
}

impl SimplifiedDims {
    pub fn rank(&self) -> usize {
        self.out_dims.len()
    }
    pub fn out_dims(&self) -> &Shape {
        &self.out_dims
    }
    pub fn in_dims(&self) -> &[Shape] {
        &self.in_dims
    }
    pub fn in_dim(&self, j: usize) -> &Shape {
        &self.in_dims[j]
    }
    pub fn num_inputs(&self) -> usize {
        self.in_dims.len()
    }
    pub fn numel(&self) -> usize {
        self.out_dims.iter().product()
    }
    /// True when no input broadcasts, so a kernel can index every array
    /// with the output's linear index.
    pub fn is_identity(&self) -> bool {
        self.in_dims.iter().all(|dims| *dims == self.out_dims)
    }
}

impl fmt::Display for SimplifiedDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <- [{}]",
            self.out_dims,
            self.in_dims.iter().map(|x| format!("{x}")).join(", ")
        )
    }
}

/// Simplifies `inputs` broadcast to `out` with the default options apart
/// from `alignment`.
pub fn simplify(inputs: &[Shape], out: &Shape, alignment: Alignment) -> Result<SimplifiedDims> {
    let options = SimplifyOptions {
        alignment,
        ..Default::default()
    };
    simplify_with(inputs, out, &options)
}

pub fn simplify_with(inputs: &[Shape], out: &Shape, options: &SimplifyOptions) -> Result<SimplifiedDims> {
    Ok(BroadcastDimsSimplifier::new(inputs, out, options)?.into_simplified())
}

/// Simplifies `inputs` against their own trailing-aligned broadcast shape.
pub fn simplify_inputs(inputs: &[Shape]) -> Result<SimplifiedDims> {
    let shapes = inputs.iter().collect::<Vec<_>>();
    // without a common shape, extending against the largest sizes reports the offending axis
    let out = broadcast_shapes(&shapes).unwrap_or_else(|| largest_sizes(&shapes));
    simplify(inputs, &out, Alignment::Trailing)
}

fn largest_sizes(shapes: &[&Shape]) -> Shape {
    let rank = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
    (0..rank)
        .map(|i| {
            shapes
                .iter()
                .filter_map(|s| s.len().checked_sub(rank - i).map(|k| s[k]))
                .max()
                .unwrap_or(1)
        })
        .collect()
}
