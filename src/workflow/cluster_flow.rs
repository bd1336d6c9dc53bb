//! 聚类流程 - 流程层
//!
//! 核心职责：定义"一个 cutoff"走完聚类阶段的完整流程
//!
//! 流程顺序：
//! 1. 创建该 cutoff 专属的输出子目录（各 cutoff 互不共享目录）
//! 2. 捕获模式调用聚类工具（非零退出不立即报错）
//! 3. 非零退出交给 OutcomeClassifier 判定：可容忍 → 继续，
//!    未分类 → 致命，中止剩余 cutoff

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::error::{AppError, PipelineError};
use crate::infrastructure::{DockerRunner, RunSpec};
use crate::models::{Batch, Cutoff, StageOutcome};
use crate::services::{OutcomeClassifier, StatusReporter, WorkspaceService};

/// 聚类流程
///
/// - 编排单个 cutoff 的聚类流程
/// - 只依赖业务能力（workspace / classifier / reporter）
/// - 不出现 Vec<Cutoff>，不关心 cutoff 遍历
pub struct ClusterFlow {
    workspace: WorkspaceService,
    classifier: OutcomeClassifier,
    runner: DockerRunner,
    reporter: Arc<StatusReporter>,
    config: Config,
}

impl ClusterFlow {
    /// 创建新的聚类流程
    pub fn new(runner: DockerRunner, reporter: Arc<StatusReporter>, config: Config) -> Self {
        Self {
            workspace: WorkspaceService::new(),
            classifier: OutcomeClassifier::new(),
            runner,
            reporter,
            config,
        }
    }

    /// 让一个 cutoff 走完聚类阶段
    ///
    /// 返回 `Succeeded` 或 `Tolerated`；致命失败上报后向上传播。
    pub async fn run(&self, batch: &Batch, cutoff: Cutoff) -> Result<StageOutcome> {
        let output_dir = self.workspace.ensure_cutoff_directory(batch, cutoff)?;

        self.reporter
            .report(&format!("🧪 正在以 cutoff {} 运行 BiG-SCAPE...", cutoff))?;

        let spec = self.clustering_spec(batch, cutoff, &output_dir);
        let result = match self.runner.run_captured(&spec).await {
            Ok(result) => result,
            Err(e) => {
                // 进程本身无法启动属于环境问题，不走分类器
                self.reporter
                    .report(&format!("❌ cutoff {} 的聚类进程无法启动", cutoff))?;
                return Err(e.into());
            }
        };

        if result.success() {
            self.reporter.report(&format!(
                "✓ cutoff {} 聚类完成 (耗时 {:.1} 秒)",
                cutoff,
                result.elapsed.as_secs_f64()
            ))?;
            return Ok(StageOutcome::Succeeded);
        }

        match self.classifier.classify(&result) {
            StageOutcome::Tolerated(reason) => {
                self.reporter.report(&format!(
                    "⚠️ cutoff {} 出现可容忍失败: {}，继续处理剩余 cutoff",
                    cutoff, reason
                ))?;
                Ok(StageOutcome::Tolerated(reason))
            }
            StageOutcome::Fatal(diagnostic) => {
                self.reporter.report(&format!(
                    "❌ cutoff {} 聚类致命失败，中止剩余 cutoff",
                    cutoff
                ))?;
                Err(AppError::Pipeline(PipelineError::ClusteringFailed {
                    cutoff: cutoff.value(),
                    diagnostic,
                })
                .into())
            }
            // classify 只产生上面两种结局
            outcome => Ok(outcome),
        }
    }

    /// 组装聚类工具的调用描述
    ///
    /// 参考数据开关是全有或全无的：挂载与 --mibig 参数同开同关。
    fn clustering_spec(&self, batch: &Batch, cutoff: Cutoff, output_dir: &Path) -> RunSpec {
        let mut mounts = vec![
            (batch.antismash_dir(), "/input".to_string()),
            (output_dir.to_path_buf(), "/output".to_string()),
        ];
        let mut args = vec![
            "--inputdir".to_string(),
            "/input".to_string(),
            "--outputdir".to_string(),
            "/output".to_string(),
            "--cutoffs".to_string(),
            cutoff.to_string(),
            "--mix".to_string(),
            "--include_singletons".to_string(),
        ];
        if self.config.include_reference_data {
            mounts.push((self.reference_data_dir(), "/mibig".to_string()));
            args.push("--mibig".to_string());
        }

        RunSpec {
            image: self.config.bigscape_image.clone(),
            args,
            mounts,
            working_dir: None,
        }
    }

    /// 参考数据目录：相对路径视为相对于流水线根目录
    fn reference_data_dir(&self) -> PathBuf {
        let dir = Path::new(&self.config.reference_data_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            Path::new(&self.config.pipeline_root).join(dir)
        }
    }
}
