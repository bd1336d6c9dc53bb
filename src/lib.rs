//! # BGC Pipeline
//!
//! 一个用于批量基因组 BGC（生物合成基因簇）挖掘的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有容器运行时入口，只暴露能力
//! - `DockerRunner` - 唯一与外部进程打交道的地方，提供检查/捕获两种运行模式
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个对象
//! - `WorkspaceService` - 批次目录布局与基因组清单能力
//! - `OutcomeClassifier` - 聚类失败的可容忍性判定能力
//! - `StatusReporter` - 会话日志 + 观察者回调能力
//! - `StatsService` - 五张统计表的生成能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个基因组 / 一个 cutoff"的完整处理流程
//! - `UnitCtx` - 上下文封装（批次名 + 基因组序号）
//! - `GenomeFlow` - 注释流程（幂等检查 → antiSMASH → 上报）
//! - `ClusterFlow` - 聚类流程（BiG-SCAPE → 结局判定 → 上报）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批次处理器，驱动三阶段流水线
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, PipelineError, RuntimeError, WorkspaceError};
pub use infrastructure::{DockerRunner, RunSpec};
pub use models::{
    Batch, Cutoff, GenomeFormat, GenomeUnit, ProcessResult, StageOutcome, TolerationReason,
};
pub use orchestrator::App;
pub use services::{Observer, OutcomeClassifier, StatsService, StatusReporter, WorkspaceService};
pub use workflow::{ClusterFlow, GenomeFlow, UnitCtx};
