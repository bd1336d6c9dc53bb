pub mod cluster_flow;
pub mod genome_flow;
pub mod unit_ctx;

pub use cluster_flow::ClusterFlow;
pub use genome_flow::GenomeFlow;
pub use unit_ctx::UnitCtx;
