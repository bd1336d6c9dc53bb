//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层驱动固定的三阶段流水线，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理一个批次：注释 → 统计汇总 → 聚类)
//!     ↓
//! workflow::GenomeFlow / ClusterFlow (处理单个基因组 / 单个 cutoff)
//!     ↓
//! services (能力层：workspace / outcome / reporter / stats)
//!     ↓
//! infrastructure (基础设施：DockerRunner)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：编排层管阶段顺序与并发，流程层管单个单元
//! 2. **资源隔离**：只有编排层持有 DockerRunner 的所有权
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务判断**：失败是否可容忍由 OutcomeClassifier 决定

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::App;
