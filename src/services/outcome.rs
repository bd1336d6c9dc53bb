//! 结果分类服务 - 业务能力层
//!
//! 只负责"判断一次非零退出是否可容忍"，不执行任何进程。
//!
//! 外部聚类工具可能在做完有效计算之后才非零退出（可选的报告渲染步骤
//! 失败），也可能在没做任何工作之前就退出（输入集退化）。两类信号
//! 分开检查，否则要么掩盖真实故障，要么对无害缺陷中止整个批次。

use tracing::debug;

use crate::models::{ProcessResult, StageOutcome, TolerationReason};

/// 已知无害信号：命中表示失败出在外部工具的已知非核心缺陷上
const BENIGN_SIGNALS: &[&str] = &[
    "no aligned sequences found",
    "starting with 0 files",
    "anchor domains not found",
    "error rendering the html template",
    "could not copy the output tree",
    "unicodedecodeerror",
];

/// 进度标记：命中表示工具已越过数据校验、进入真实计算
const PROGRESS_MARKERS: &[&str] = &[
    "predicting domains",
    "calculating distance matrix",
    "generating network files",
    "writing clustering output",
];

/// 结果分类器
///
/// 职责：
/// - 对照固定的模式表做小写子串匹配
/// - 每个非零退出的结果恰好映射到一种结局
/// - 不出现 Batch / Cutoff，不关心流程顺序
pub struct OutcomeClassifier;

impl OutcomeClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 对一次非零退出的捕获结果分类
    ///
    /// 决策表：
    ///
    /// | 无害信号 | 进度标记 | 结局 |
    /// |---|---|---|
    /// | 命中 | 命中 | Tolerated(AuxiliaryArtifactSkipped) |
    /// | 命中 | 未中 | Tolerated(NothingToCluster) |
    /// | 未中 | 任意 | Fatal(完整捕获输出) |
    pub fn classify(&self, result: &ProcessResult) -> StageOutcome {
        debug_assert!(!result.success(), "退出码为零时不应调用分类器");

        let haystack = format!("{}\n{}", result.stdout, result.stderr).to_lowercase();
        let benign = BENIGN_SIGNALS.iter().any(|p| haystack.contains(p));
        let progressed = PROGRESS_MARKERS.iter().any(|p| haystack.contains(p));
        debug!(
            "分类非零退出 (code: {:?}): 无害信号={} 进度标记={}",
            result.exit_code, benign, progressed
        );

        match (benign, progressed) {
            (true, true) => StageOutcome::Tolerated(TolerationReason::AuxiliaryArtifactSkipped),
            (true, false) => StageOutcome::Tolerated(TolerationReason::NothingToCluster),
            (false, _) => StageOutcome::Fatal(format!(
                "命令: {}\n标准输出:\n{}\n标准错误:\n{}",
                result.command, result.stdout, result.stderr
            )),
        }
    }
}

impl Default for OutcomeClassifier {
    fn default() -> Self {
        Self::new()
    }
}
