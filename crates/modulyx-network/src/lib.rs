//! modulyx-network — Interaction network assembly and module partitioning.

pub mod graph;
pub mod assembler;
pub mod mcl;
pub mod partition;

pub use assembler::{assemble, build_network, filter_interactions, find_duplicate_pairs, AssembledNetwork};
pub use graph::InteractionGraph;
pub use mcl::{Clusterer, MarkovClustering};
pub use partition::{partition, Partition};
