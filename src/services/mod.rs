pub mod outcome;
pub mod reporter;
pub mod stats;
pub mod workspace;

pub use outcome::OutcomeClassifier;
pub use reporter::{Observer, StatusReporter};
pub use stats::StatsService;
pub use workspace::{GenomeInventory, WorkspaceService};
