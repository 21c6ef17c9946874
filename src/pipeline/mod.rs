//! Page pipeline: grid → cells → variants → text → normalized tuples.
//!
//! One page is processed single-threaded from start to finish; independent
//! pages may run in parallel ([`PagePipeline::process_batch`]). Cell crops
//! live only inside the loop that reads them.

mod params;
mod progress;
mod runner;

pub use params::LedgerParams;
pub use progress::{Progress, ProgressSnapshot};
pub use runner::{PagePipeline, PageRequest, TupleSink};
