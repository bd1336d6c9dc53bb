use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 流水线根目录（batches/ 的父目录）
    pub pipeline_root: String,
    /// 注释阶段同时处理的基因组数量（1 = 逐个处理）
    pub max_concurrent_genomes: usize,
    /// 容器运行时可执行文件
    pub container_runtime: String,
    /// antiSMASH 镜像
    pub antismash_image: String,
    /// BiG-SCAPE 镜像
    pub bigscape_image: String,
    /// 是否启用 MIBiG 参考数据（挂载与参数同开同关）
    pub include_reference_data: bool,
    /// MIBiG 参考数据目录（仅在 include_reference_data 为 true 时挂载）
    pub reference_data_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 会话日志文件名（写入批次目录下）
    pub session_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline_root: ".".to_string(),
            max_concurrent_genomes: 1,
            container_runtime: "docker".to_string(),
            antismash_image: "antismash/standalone".to_string(),
            bigscape_image: "nselem/big-scape".to_string(),
            include_reference_data: false,
            reference_data_dir: "reference/mibig".to_string(),
            verbose_logging: false,
            session_log_file: "session_log.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            pipeline_root: std::env::var("PIPELINE_ROOT").unwrap_or(default.pipeline_root),
            max_concurrent_genomes: std::env::var("MAX_CONCURRENT_GENOMES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_genomes),
            container_runtime: std::env::var("CONTAINER_RUNTIME").unwrap_or(default.container_runtime),
            antismash_image: std::env::var("ANTISMASH_IMAGE").unwrap_or(default.antismash_image),
            bigscape_image: std::env::var("BIGSCAPE_IMAGE").unwrap_or(default.bigscape_image),
            include_reference_data: std::env::var("INCLUDE_REFERENCE_DATA").ok().and_then(|v| v.parse().ok()).unwrap_or(default.include_reference_data),
            reference_data_dir: std::env::var("REFERENCE_DATA_DIR").unwrap_or(default.reference_data_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            session_log_file: std::env::var("SESSION_LOG_FILE").unwrap_or(default.session_log_file),
        }
    }

    /// 从 TOML 文件加载配置（缺省字段使用默认值）
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config)
    }
}
