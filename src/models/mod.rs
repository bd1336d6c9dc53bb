pub mod batch;
pub mod process;
pub mod region;

pub use batch::{Batch, Cutoff, GenomeFormat, GenomeUnit, EXTENSION_FORMATS};
pub use process::{ProcessResult, StageOutcome, TolerationReason};
pub use region::{BatchStatsRow, BgcRecord, CatalogRow, GenomeStatsRow, TypeCountRow};
