use std::{error, fmt};

/// The only way shape simplification can fail: the caller handed in shapes
/// that cannot be broadcast to the output. Nothing is retried, the error is
/// reported before any kernel runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidArgument {
    /// Axes are 1-based, as in the message.
    AxisMismatch {
        in_axis: usize,
        out_axis: usize,
        expected: usize,
        received: usize,
    },
    RankTooLarge {
        in_rank: usize,
        out_rank: usize,
    },
    AxisOutOfRange {
        axis: usize,
        in_rank: usize,
        out_rank: usize,
    },
    NoInputs,
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgument: ")?;
        match self {
            InvalidArgument::AxisMismatch {
                in_axis,
                out_axis,
                expected,
                received,
            } => write!(
                f,
                "The {}-th dimension of input tensor is expected to be equal with the {}-th dimension of output tensor {} or 1, but received {}.",
                in_axis, out_axis, expected, received
            ),
            InvalidArgument::RankTooLarge { in_rank, out_rank } => write!(
                f,
                "input tensor of rank {} cannot be broadcast to output tensor of rank {}",
                in_rank, out_rank
            ),
            InvalidArgument::AxisOutOfRange {
                axis,
                in_rank,
                out_rank,
            } => write!(
                f,
                "alignment axis {} places an input of rank {} outside an output of rank {}",
                axis, in_rank, out_rank
            ),
            InvalidArgument::NoInputs => write!(f, "at least one input shape is required"),
        }
    }
}

impl error::Error for InvalidArgument {}
