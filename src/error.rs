use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 批次工作区相关错误
    Workspace(WorkspaceError),
    /// 容器运行时相关错误
    Runtime(RuntimeError),
    /// 流水线业务错误
    Pipeline(PipelineError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Workspace(e) => write!(f, "工作区错误: {}", e),
            AppError::Runtime(e) => write!(f, "运行时错误: {}", e),
            AppError::Pipeline(e) => write!(f, "流水线错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Workspace(e) => Some(e),
            AppError::Runtime(e) => Some(e),
            AppError::Pipeline(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 批次工作区相关错误
#[derive(Debug)]
pub enum WorkspaceError {
    /// 批次不存在
    BatchNotFound {
        path: String,
    },
    /// 输入目录不存在
    InputDirNotFound {
        path: String,
    },
    /// 输入目录中没有可识别的基因组文件
    NoGenomeFiles {
        path: String,
    },
    /// 文件系统操作失败
    Io {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceError::BatchNotFound { path } => {
                write!(f, "批次不存在: {}", path)
            }
            WorkspaceError::InputDirNotFound { path } => {
                write!(f, "输入目录不存在: {}", path)
            }
            WorkspaceError::NoGenomeFiles { path } => {
                write!(f, "输入目录中没有可识别的基因组文件: {}", path)
            }
            WorkspaceError::Io { path, source } => {
                write!(f, "文件系统操作失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkspaceError::Io { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 容器运行时相关错误
#[derive(Debug)]
pub enum RuntimeError {
    /// 容器运行时不可达（就绪探测失败或无法启动进程）
    EnvironmentUnavailable {
        runtime: String,
        detail: String,
    },
    /// 检查模式下外部命令非零退出
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::EnvironmentUnavailable { runtime, detail } => {
                write!(f, "容器运行时 {} 不可用: {}", runtime, detail)
            }
            RuntimeError::CommandFailed {
                command,
                exit_code,
                stderr,
            } => {
                write!(
                    f,
                    "外部命令失败 (退出码: {:?}): {}\n{}",
                    exit_code, command, stderr
                )
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

/// 流水线业务错误
#[derive(Debug)]
pub enum PipelineError {
    /// 未选择任何 cutoff
    EmptyCutoffs,
    /// cutoff 超出 (0, 1] 范围
    InvalidCutoff {
        value: f64,
    },
    /// 聚类阶段未分类的非零退出
    ClusteringFailed {
        cutoff: f64,
        diagnostic: String,
    },
    /// 统计汇总子阶段失败
    AggregationFailed {
        stage: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::EmptyCutoffs => {
                write!(f, "至少需要选择一个 BiG-SCAPE cutoff")
            }
            PipelineError::InvalidCutoff { value } => {
                write!(f, "cutoff {} 超出 (0, 1] 范围", value)
            }
            PipelineError::ClusteringFailed { cutoff, diagnostic } => {
                write!(f, "聚类失败 (cutoff: {}): {}", cutoff, diagnostic)
            }
            PipelineError::AggregationFailed { stage, source } => {
                write!(f, "统计汇总失败 (子阶段: {}): {}", stage, source)
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::AggregationFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建容器运行时不可用错误
    pub fn environment_unavailable(
        runtime: impl Into<String>,
        detail: impl fmt::Display,
    ) -> Self {
        AppError::Runtime(RuntimeError::EnvironmentUnavailable {
            runtime: runtime.into(),
            detail: detail.to_string(),
        })
    }

    /// 创建检查模式命令失败错误
    pub fn command_failed(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        AppError::Runtime(RuntimeError::CommandFailed {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        })
    }

    /// 创建文件系统操作错误
    pub fn workspace_io(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Workspace(WorkspaceError::Io {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
