//! Batching module
//!
//! Bounded windows of flat records. The batch size is the only thing that
//! bounds memory on arbitrarily large inputs.

mod batcher;
mod types;

pub use batcher::Batcher;
pub use types::Batch;
