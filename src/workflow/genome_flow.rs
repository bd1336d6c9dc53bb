//! 基因组注释流程 - 流程层
//!
//! 核心职责：定义"一个基因组"走完注释阶段的完整流程
//!
//! 流程顺序：
//! 1. 幂等检查（注释输出子目录已存在 → 跳过）
//! 2. 检查模式调用注释工具（非零退出没有可容忍的变体）
//! 3. 每次转换先上报，再决定是否向上传播错误

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::infrastructure::{DockerRunner, RunSpec};
use crate::models::{Batch, GenomeUnit, StageOutcome};
use crate::services::{StatusReporter, WorkspaceService};
use crate::workflow::unit_ctx::UnitCtx;

/// 基因组注释流程
///
/// - 编排单个基因组的注释流程
/// - 不持有容器运行时本体（只借用 DockerRunner 能力）
/// - 不出现 Vec<GenomeUnit>，不关心批次遍历
pub struct GenomeFlow {
    workspace: WorkspaceService,
    runner: DockerRunner,
    reporter: Arc<StatusReporter>,
    config: Config,
}

impl GenomeFlow {
    /// 创建新的注释流程
    pub fn new(runner: DockerRunner, reporter: Arc<StatusReporter>, config: Config) -> Self {
        Self {
            workspace: WorkspaceService::new(),
            runner,
            reporter,
            config,
        }
    }

    /// 让一个基因组走完注释阶段
    ///
    /// 返回 `SkippedAlreadyDone` 或 `Succeeded`；注释失败一律致命，
    /// 上报后把错误向上传播（由编排层中止整个批次）。
    pub async fn run(
        &self,
        batch: &Batch,
        unit: &GenomeUnit,
        ctx: &UnitCtx,
    ) -> Result<StageOutcome> {
        // ========== 幂等检查 ==========
        // 只看子目录是否存在，不校验内容（已知局限，见 DESIGN.md）
        if self.workspace.annotation_output_exists(batch, unit) {
            self.reporter.report(&format!(
                "{} ⏭️ {} 的注释输出已存在，跳过",
                ctx, unit.file_name
            ))?;
            return Ok(StageOutcome::SkippedAlreadyDone);
        }

        self.reporter.report(&format!(
            "{} 🧬 正在对 {} 运行 antiSMASH...",
            ctx, unit.file_name
        ))?;

        let spec = self.annotation_spec(batch, unit);
        match self.runner.run_checked(&spec).await {
            Ok(result) => {
                self.reporter.report(&format!(
                    "{} ✓ {} 注释完成 (耗时 {:.1} 秒)",
                    ctx,
                    unit.file_name,
                    result.elapsed.as_secs_f64()
                ))?;
                Ok(StageOutcome::Succeeded)
            }
            Err(e) => {
                self.reporter.report(&format!(
                    "{} ❌ {} 注释失败，中止整个批次: {}",
                    ctx,
                    unit.file_name,
                    crate::utils::truncate_text(&e.to_string(), 200)
                ))?;
                Err(e.into())
            }
        }
    }

    /// 组装注释工具的调用描述
    fn annotation_spec(&self, batch: &Batch, unit: &GenomeUnit) -> RunSpec {
        RunSpec {
            image: self.config.antismash_image.clone(),
            args: vec![
                unit.file_name.clone(),
                "--genefinding-tool".to_string(),
                "prodigal".to_string(),
                "--output-dir".to_string(),
                format!("/output/{}", unit.stem),
            ],
            mounts: vec![
                (batch.input_dir(), "/input".to_string()),
                (batch.antismash_dir(), "/output".to_string()),
            ],
            working_dir: Some("/input".to_string()),
        }
    }
}
