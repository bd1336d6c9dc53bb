//! 外部进程结果与阶段结局模型

use std::fmt::Display;
use std::time::Duration;

/// 一次外部进程调用的捕获结果
///
/// 产生后不可变。退出码为 `None` 表示进程被信号终止。
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// 完整命令行（用于日志和诊断）
    pub command: String,
    /// 退出码
    pub exit_code: Option<i32>,
    /// 捕获的标准输出
    pub stdout: String,
    /// 捕获的标准错误
    pub stderr: String,
    /// 进程耗时
    pub elapsed: Duration,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// 容忍失败的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TolerationReason {
    /// 工具已完成核心计算，仅附加产物生成失败
    AuxiliaryArtifactSkipped,
    /// 输入集退化，没有可比较的内容
    NothingToCluster,
}

impl Display for TolerationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TolerationReason::AuxiliaryArtifactSkipped => {
                write!(f, "核心统计已完成，仅附加产物生成失败，已跳过")
            }
            TolerationReason::NothingToCluster => {
                write!(f, "没有可比较的输入，无内容可聚类")
            }
        }
    }
}

/// 单个工作单元在某一阶段的结局
///
/// 每个单元每阶段恰好产生一次，由编排层决定是否继续，
/// 由状态上报决定消息措辞。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// 成功完成
    Succeeded,
    /// 输出已存在，本次跳过
    SkippedAlreadyDone,
    /// 非零退出但判定为可容忍
    Tolerated(TolerationReason),
    /// 致命失败，附完整诊断文本
    Fatal(String),
}
