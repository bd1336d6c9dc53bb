//! 容器运行器 - 基础设施层
//!
//! 持有唯一的容器运行时资源，只暴露"运行外部工具"的能力
//!
//! 两种调用模式：
//! - 检查模式 `run_checked`：非零退出立即视为致命错误（注释阶段专用，
//!   注释失败没有可容忍的变体）
//! - 捕获模式 `run_captured`：非零退出不报错，把捕获结果交给
//!   `OutcomeClassifier` 解读（聚类阶段专用）
//!
//! 每次调用独占一个外部进程和它的输出管道，并发调用之间的
//! 捕获流不会交错。

use std::path::PathBuf;
use std::time::Instant;

use tokio::process::Command;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::ProcessResult;

/// 单次容器调用的描述
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// 镜像名
    pub image: String,
    /// 传给容器内工具的参数
    pub args: Vec<String>,
    /// 卷挂载（宿主路径 → 容器内路径）
    pub mounts: Vec<(PathBuf, String)>,
    /// 容器内工作目录
    pub working_dir: Option<String>,
}

/// 容器运行器
///
/// 职责：
/// - 持有容器运行时可执行文件名
/// - 暴露 ping / run_checked / run_captured 能力
/// - 不认识 Batch / GenomeUnit
/// - 不处理业务流程
#[derive(Debug, Clone)]
pub struct DockerRunner {
    runtime: String,
}

impl DockerRunner {
    /// 创建新的容器运行器
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
        }
    }

    /// 就绪探测
    ///
    /// 在任何阶段开始前对容器运行时执行一次零参数的简单命令，
    /// 失败即 EnvironmentUnavailable，避免做完部分工作才发现环境不可用。
    pub async fn ping(&self) -> AppResult<()> {
        let output = Command::new(&self.runtime)
            .arg("version")
            .output()
            .await
            .map_err(|e| AppError::environment_unavailable(&self.runtime, e))?;

        if !output.status.success() {
            return Err(AppError::environment_unavailable(
                &self.runtime,
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        debug!("容器运行时 {} 就绪", self.runtime);
        Ok(())
    }

    /// 检查模式：非零退出立即视为致命错误
    pub async fn run_checked(&self, spec: &RunSpec) -> AppResult<ProcessResult> {
        let result = self.invoke(spec).await?;
        if !result.success() {
            return Err(AppError::command_failed(
                result.command.clone(),
                result.exit_code,
                result.stderr.clone(),
            ));
        }
        Ok(result)
    }

    /// 捕获模式：非零退出不报错，返回捕获结果供分类器解读
    ///
    /// 只有进程本身无法启动时才返回错误。
    pub async fn run_captured(&self, spec: &RunSpec) -> AppResult<ProcessResult> {
        self.invoke(spec).await
    }

    /// 执行一次容器调用并捕获输出
    async fn invoke(&self, spec: &RunSpec) -> AppResult<ProcessResult> {
        let argv = self.build_argv(spec);
        let command = format!("{} {}", self.runtime, argv.join(" "));
        debug!("执行: {}", command);

        let started = Instant::now();
        let output = Command::new(&self.runtime)
            .args(&argv)
            .output()
            .await
            .map_err(|e| AppError::environment_unavailable(&self.runtime, e))?;

        Ok(ProcessResult {
            command,
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            elapsed: started.elapsed(),
        })
    }

    /// 组装容器运行时参数
    fn build_argv(&self, spec: &RunSpec) -> Vec<String> {
        let mut argv = vec!["run".to_string(), "--rm".to_string()];
        for (host, container) in &spec.mounts {
            argv.push("-v".to_string());
            argv.push(format!("{}:{}", host.display(), container));
        }
        if let Some(dir) = &spec.working_dir {
            argv.push("-w".to_string());
            argv.push(dir.clone());
        }
        argv.push(spec.image.clone());
        argv.extend(spec.args.iter().cloned());
        argv
    }
}


#[cfg(test)]
impl DockerRunner {
    /// 测试辅助：绕过 run --rm 前缀直接调用运行时
    async fn invoke_raw(&self, args: &[&str]) -> AppResult<ProcessResult> {
        let started = Instant::now();
        let output = Command::new(&self.runtime)
            .args(args)
            .output()
            .await
            .map_err(|e| AppError::environment_unavailable(&self.runtime, e))?;
        Ok(ProcessResult {
            command: format!("{} {}", self.runtime, args.join(" ")),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            elapsed: started.elapsed(),
        })
    }
}
