pub mod simplify;

pub use simplify::{
    broadcast_shapes, can_broadcast_to, simplify, simplify_inputs, simplify_with, Alignment,
    BroadcastDimsSimplifier, BroadcastIndexer, InvalidArgument, MergePredicate, Shape,
    SimplifiedDims, SimplifyOptions,
};
