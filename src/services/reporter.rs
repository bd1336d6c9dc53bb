//! 状态上报服务 - 业务能力层
//!
//! 只负责"把一条进度消息追加进会话日志并转发给观察者"。
//!
//! 每次流水线运行创建一个新的会话对象，由调用方控制生命周期。
//! 消息不压缩、不截断、不去重：每次阶段转换恰好产生一条。

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing::info;

/// 观察者回调：按序接收人类可读的进度消息
pub type Observer = Box<dyn Fn(&str) + Send + Sync>;

/// 状态上报服务
///
/// 职责：
/// - 持有本次运行的会话日志文件（追加写，单写者纪律由 Mutex 保证）
/// - 把每条消息转发给可选的观察者回调
/// - 不出现 Batch / GenomeUnit，不关心流程顺序
pub struct StatusReporter {
    log_path: PathBuf,
    file: Mutex<File>,
    observer: Option<Observer>,
}

impl StatusReporter {
    /// 创建新的会话上报器，并写入会话头
    pub fn create(log_path: impl Into<PathBuf>, observer: Option<Observer>) -> Result<Self> {
        let log_path = log_path.into();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let header = format!(
            "{}\n批次处理会话 - {}\n{}\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        file.write_all(header.as_bytes())?;

        Ok(Self {
            log_path,
            file: Mutex::new(file),
            observer,
        })
    }

    /// 上报一条进度消息
    ///
    /// 依次写入会话日志、转发观察者、镜像到 tracing。
    pub fn report(&self, message: &str) -> Result<()> {
        {
            let mut file = self
                .file
                .lock()
                .map_err(|_| anyhow!("会话日志锁已被污染"))?;
            writeln!(file, "{}", message)?;
        }

        if let Some(observer) = &self.observer {
            observer(message);
        }

        info!("{}", message);
        Ok(())
    }

    /// 会话日志文件路径
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
