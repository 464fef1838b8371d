pub mod classifier;
pub mod queue;
