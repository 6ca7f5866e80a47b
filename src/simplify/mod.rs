pub mod error;
pub use error::InvalidArgument;

mod extend;

pub mod indexer;
pub use indexer::BroadcastIndexer;

pub mod merge;
pub use merge::MergePredicate;

pub mod shape;
pub use shape::{broadcast_shapes, can_broadcast_to, numel, DimVector, Shape};

pub mod simplifier;
pub use simplifier::{
    simplify, simplify_inputs, simplify_with, Alignment, BroadcastDimsSimplifier, SimplifiedDims,
    SimplifyOptions,
};
