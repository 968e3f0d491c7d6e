pub mod checkpoint;
pub mod record;

pub use checkpoint::{CheckpointError, Checkpoints};
pub use record::*;
