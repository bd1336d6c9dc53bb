//! 批次处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，驱动固定的三阶段流水线。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：就绪探测容器运行时、创建 DockerRunner
//! 2. **清单扫描**：通过工作区服务获取基因组清单（先于任何目录创建）
//! 3. **阶段一 注释**：逐个基因组调用注释流程，输出已存在则跳过；
//!    任何致命失败立即中止，后续基因组不再调用
//! 4. **阶段二 统计汇总**：按固定顺序执行五个子阶段，任何失败都致命
//! 5. **阶段三 聚类**：逐个 cutoff 调用聚类流程，可容忍失败不中止
//! 6. **并发控制**：注释阶段用 Semaphore 限制并发（默认 1 = 顺序）
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个基因组/cutoff 的细节，向下委托流程层
//! - **会话隔离**：每次运行创建一个新的 StatusReporter，由调用方传入观察者
//! - **显式结局**：阶段结局通过 StageOutcome 返回值传播，绝不就地终止进程
//! - **单运行纪律**：`run_batch` 以 `&mut self` 独占应用，同一批次
//!   不允许两个并发运行（磁盘上的幂等标记在并发写者下不安全）

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{AppError, PipelineError};
use crate::infrastructure::DockerRunner;
use crate::models::{Batch, Cutoff, GenomeUnit, StageOutcome};
use crate::services::{Observer, StatsService, StatusReporter, WorkspaceService};
use crate::workflow::{ClusterFlow, GenomeFlow, UnitCtx};

/// 应用主结构
pub struct App {
    config: Config,
    runner: DockerRunner,
    workspace: WorkspaceService,
    stats: StatsService,
}

impl App {
    /// 初始化应用
    ///
    /// 包含容器运行时就绪探测：环境不可用要在做任何工作之前暴露。
    pub async fn initialize(config: Config) -> Result<Self> {
        let runner = DockerRunner::new(&config.container_runtime);
        runner.ping().await?;

        log_startup(&config);

        Ok(Self {
            config,
            runner,
            workspace: WorkspaceService::new(),
            stats: StatsService::new(),
        })
    }

    /// 运行一个批次的完整流水线
    ///
    /// 阶段间严格顺序：注释 → 统计汇总 → 聚类。致命条件直接向上
    /// 传播，磁盘上的部分产出保持原样（不回滚）。
    pub async fn run_batch(
        &mut self,
        batch_name: &str,
        cutoffs: &[Cutoff],
        observer: Option<Observer>,
    ) -> Result<()> {
        // 空 cutoff 集在任何阶段开始前拒绝
        if cutoffs.is_empty() {
            return Err(AppError::Pipeline(PipelineError::EmptyCutoffs).into());
        }

        let batch = Batch::new(&self.config.pipeline_root, batch_name);

        // 清单扫描先于任何目录创建：NotFound / Empty 时不留下部分工作
        let inventory = self.workspace.list_genome_units(&batch)?;
        self.workspace.ensure_output_directories(&batch)?;

        let reporter = Arc::new(StatusReporter::create(
            batch.dir().join(&self.config.session_log_file),
            observer,
        )?);

        reporter.report(&format!(
            "🚀 开始处理批次 {}（{} 个基因组，{} 个 cutoff）",
            batch_name,
            inventory.units.len(),
            cutoffs.len()
        ))?;
        for rejected in &inventory.rejected {
            reporter.report(&format!(
                "⚠️ 已拒绝非序列文本文件: {}（保持原样，未改名）",
                rejected
            ))?;
        }

        // ========== 阶段一：antiSMASH 注释 ==========
        let annotation = self
            .run_annotation_stage(&batch, &inventory.units, reporter.clone())
            .await?;
        reporter.report(&format!(
            "📦 注释阶段完成: 新注释 {}，跳过 {}",
            annotation.annotated, annotation.skipped
        ))?;

        // ========== 阶段二：统计汇总 ==========
        self.run_aggregation_stage(&batch, &reporter)?;

        // ========== 阶段三：BiG-SCAPE 聚类 ==========
        let clustering = self
            .run_clustering_stage(&batch, cutoffs, reporter.clone())
            .await?;
        reporter.report(&format!(
            "📦 聚类阶段完成: 成功 {}，容忍失败 {}",
            clustering.succeeded, clustering.tolerated
        ))?;

        reporter.report(&format!("✅ 批次 {} 全部处理完成", batch_name))?;
        Ok(())
    }

    /// 删除整个批次（递归、不可逆）
    pub fn delete_batch(&self, batch_name: &str) -> Result<()> {
        let batch = Batch::new(&self.config.pipeline_root, batch_name);
        self.workspace.delete_batch(&batch)?;
        info!("🗑️ 批次 {} 已删除", batch_name);
        Ok(())
    }

    /// 注释阶段：清单顺序逐个处理，Semaphore 限制并发
    ///
    /// 一个分批内的致命失败会阻止所有后续分批开始（默认并发 1，
    /// 即失败后剩余基因组一律不再调用）。
    async fn run_annotation_stage(
        &self,
        batch: &Batch,
        units: &[GenomeUnit],
        reporter: Arc<StatusReporter>,
    ) -> Result<AnnotationStats> {
        let max_concurrent = self.config.max_concurrent_genomes.max(1);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let total = units.len();
        let mut stats = AnnotationStats::default();

        for (chunk_index, chunk) in units.chunks(max_concurrent).enumerate() {
            let chunk_start = chunk_index * max_concurrent;
            let mut handles = Vec::new();

            for (idx, unit) in chunk.iter().enumerate() {
                let unit_index = chunk_start + idx + 1;
                let permit = semaphore.clone().acquire_owned().await?;

                let flow = GenomeFlow::new(
                    self.runner.clone(),
                    reporter.clone(),
                    self.config.clone(),
                );
                let batch_clone = batch.clone();
                let unit_clone = unit.clone();
                let ctx = UnitCtx::new(batch.name().to_string(), unit_index, total);

                let handle = tokio::spawn(async move {
                    let _permit = permit;
                    flow.run(&batch_clone, &unit_clone, &ctx).await
                });
                handles.push((unit_index, handle));
            }

            // 等待本批全部结束；任何致命失败都阻止后续分批开始
            let mut chunk_error: Option<anyhow::Error> = None;
            for (unit_index, handle) in handles {
                match handle.await {
                    Ok(Ok(StageOutcome::SkippedAlreadyDone)) => stats.skipped += 1,
                    Ok(Ok(_)) => stats.annotated += 1,
                    Ok(Err(e)) => {
                        error!("[基因组 {}] 注释失败: {}", unit_index, e);
                        if chunk_error.is_none() {
                            chunk_error = Some(e);
                        }
                    }
                    Err(e) => {
                        error!("[基因组 {}] 任务执行失败: {}", unit_index, e);
                        if chunk_error.is_none() {
                            chunk_error = Some(e.into());
                        }
                    }
                }
            }
            if let Some(e) = chunk_error {
                return Err(e);
            }
        }

        Ok(stats)
    }

    /// 统计汇总阶段：五个子阶段按固定顺序执行
    ///
    /// 每个子阶段只读取更早子阶段产出的表，任何失败都致命
    /// （统计表之间有一致性假设，不可单独恢复）。
    fn run_aggregation_stage(&self, batch: &Batch, reporter: &StatusReporter) -> Result<()> {
        reporter.report("📊 开始统计汇总...")?;

        self.aggregation_step(reporter, "主 BGC 表", self.stats.build_master_table(batch))?;
        self.aggregation_step(reporter, "基因组统计", self.stats.build_genome_stats(batch))?;
        self.aggregation_step(reporter, "批次统计", self.stats.build_batch_stats(batch))?;
        self.aggregation_step(reporter, "类型频次表", self.stats.build_type_stats(batch))?;
        self.aggregation_step(reporter, "汇总目录", self.stats.build_catalog(batch))?;

        Ok(())
    }

    /// 上报单个汇总子阶段的结果，失败时包装为致命错误
    fn aggregation_step(
        &self,
        reporter: &StatusReporter,
        stage: &str,
        result: Result<usize>,
    ) -> Result<usize> {
        match result {
            Ok(count) => {
                reporter.report(&format!("📊 {} 已写入 {} 行", stage, count))?;
                Ok(count)
            }
            Err(e) => {
                reporter.report(&format!("❌ 统计汇总失败（{}）: {}", stage, e))?;
                Err(AppError::Pipeline(PipelineError::AggregationFailed {
                    stage: stage.to_string(),
                    source: e.into(),
                })
                .into())
            }
        }
    }

    /// 聚类阶段：逐个 cutoff 处理
    ///
    /// 可容忍失败不中止剩余 cutoff，致命失败立即向上传播。
    async fn run_clustering_stage(
        &self,
        batch: &Batch,
        cutoffs: &[Cutoff],
        reporter: Arc<StatusReporter>,
    ) -> Result<ClusteringStats> {
        let flow = ClusterFlow::new(self.runner.clone(), reporter, self.config.clone());
        let mut stats = ClusteringStats::default();

        for cutoff in cutoffs {
            match flow.run(batch, *cutoff).await? {
                StageOutcome::Tolerated(_) => stats.tolerated += 1,
                _ => stats.succeeded += 1,
            }
        }

        Ok(stats)
    }
}

/// 注释阶段统计
#[derive(Debug, Default)]
struct AnnotationStats {
    annotated: usize,
    skipped: usize,
}

/// 聚类阶段统计
#[derive(Debug, Default)]
struct ClusteringStats {
    succeeded: usize,
    tolerated: usize,
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 BGC 流水线就绪");
    info!("📂 流水线根目录: {}", config.pipeline_root);
    info!("📊 注释阶段最大并发数: {}", config.max_concurrent_genomes);
    info!("{}", "=".repeat(60));
}
