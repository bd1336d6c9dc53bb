//! 工作单元上下文
//!
//! 封装"我正在处理哪个批次的第几个基因组"这一信息

use std::fmt::Display;

/// 基因组处理上下文
///
/// 仅用于日志与上报消息的前缀，不携带业务数据
#[derive(Debug, Clone)]
pub struct UnitCtx {
    /// 批次名
    pub batch_name: String,

    /// 基因组在清单中的序号（从1开始）
    pub unit_index: usize,

    /// 清单总数
    pub total_units: usize,
}

impl UnitCtx {
    /// 创建新的单元上下文
    pub fn new(batch_name: String, unit_index: usize, total_units: usize) -> Self {
        Self {
            batch_name,
            unit_index,
            total_units,
        }
    }
}

impl Display for UnitCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[批次 {} 基因组 {}/{}]",
            self.batch_name, self.unit_index, self.total_units
        )
    }
}
