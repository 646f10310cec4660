pub mod analysis;
pub mod appearances;
pub mod bundle;
pub mod classifier;
pub mod config;
pub mod correlation;
pub mod dataset;
pub mod error;
pub mod features;
pub mod form;
pub mod head_to_head;
pub mod model;
pub mod reduce;
pub mod rounding;
pub mod splits;
pub mod standings;
pub mod training;

#[cfg(test)]
mod testutil;
