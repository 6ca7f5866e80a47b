use anyhow::Result;

use super::{error::InvalidArgument, shape::DimVector, Alignment};

// Both shapes are in natural order. The alignment only matters when the input
// has a lower rank than the output; equal ranks always line up from axis 0.
pub(crate) fn extend_dims(in_dim: &[usize], out_dims: &[usize], alignment: Alignment) -> Result<DimVector> {
    let rank = out_dims.len();
    let in_rank = in_dim.len();
    if in_rank > rank {
        return Err(InvalidArgument::RankTooLarge {
            in_rank,
            out_rank: rank,
        }
        .into());
    }

    let start = if in_rank == rank {
        0
    } else {
        match alignment {
            Alignment::Trailing => rank - in_rank,
            Alignment::Axis(axis) if axis > rank - in_rank => {
                return Err(InvalidArgument::AxisOutOfRange {
                    axis,
                    in_rank,
                    out_rank: rank,
                }
                .into());
            }
            Alignment::Axis(axis) => axis,
        }
    };

    let mut extended = vec![1; rank];
    for (in_idx, &received) in in_dim.iter().enumerate() {
        let out_idx = start + in_idx;
        let expected = out_dims[out_idx];
        if received != expected && received != 1 {
            return Err(InvalidArgument::AxisMismatch {
                in_axis: in_idx + 1,
                out_axis: out_idx + 1,
                expected,
                received,
            }
            .into());
        }
        extended[out_idx] = received;
    }
    Ok(extended)
}
