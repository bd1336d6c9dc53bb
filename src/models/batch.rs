//! 批次与基因组模型
//!
//! 描述一个批次在磁盘上的目录布局，以及批次内的单个基因组输入文件。
//! 目录约定（与流水线根目录相对）：
//!
//! ```text
//! batches/<批次名>/
//!     input/              基因组输入文件
//!     antismash/<stem>/   每个基因组一个注释输出子目录
//!     bigscape/cutoff_<c>/  每个相似度阈值一个聚类输出子目录
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, PipelineError};

/// 识别的基因组文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenomeFormat {
    /// 核酸序列（.fna / .fasta）
    Nucleotide,
    /// 已注释记录（.gbk）
    Annotated,
    /// 普通文本（.txt，需内容嗅探后才能归一化为序列格式）
    GenericText,
}

/// 扩展名 → 格式静态映射表
pub static EXTENSION_FORMATS: phf::Map<&'static str, GenomeFormat> = phf::phf_map! {
    "fna" => GenomeFormat::Nucleotide,
    "fasta" => GenomeFormat::Nucleotide,
    "gbk" => GenomeFormat::Annotated,
    "txt" => GenomeFormat::GenericText,
};

/// 批次
///
/// 身份 = 名称（唯一、文件系统安全）。持有目录布局知识，不做任何 I/O。
#[derive(Debug, Clone)]
pub struct Batch {
    name: String,
    dir: PathBuf,
}

impl Batch {
    /// 根据流水线根目录和批次名构建批次
    pub fn new(pipeline_root: impl AsRef<Path>, name: impl Into<String>) -> Self {
        let name = name.into();
        let dir = pipeline_root.as_ref().join("batches").join(&name);
        Self { name, dir }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 批次根目录
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 基因组输入目录
    pub fn input_dir(&self) -> PathBuf {
        self.dir.join("input")
    }

    /// 注释输出目录（每个基因组一个子目录）
    pub fn antismash_dir(&self) -> PathBuf {
        self.dir.join("antismash")
    }

    /// 聚类输出目录（每个 cutoff 一个子目录）
    pub fn bigscape_dir(&self) -> PathBuf {
        self.dir.join("bigscape")
    }

    /// 某个 cutoff 专属的聚类输出子目录
    pub fn cutoff_dir(&self, cutoff: Cutoff) -> PathBuf {
        self.bigscape_dir().join(format!("cutoff_{}", cutoff))
    }

    // ========== 统计表路径 ==========

    pub fn master_table_path(&self) -> PathBuf {
        self.dir.join("master_bgc_antismash.csv")
    }

    pub fn genome_stats_path(&self) -> PathBuf {
        self.dir.join("genome_bgc_stats.csv")
    }

    pub fn batch_stats_path(&self) -> PathBuf {
        self.dir.join("batch_bgc_stats.csv")
    }

    pub fn type_stats_path(&self) -> PathBuf {
        self.dir.join("bgc_type_stats.csv")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join("bgc_catalog.csv")
    }
}

/// 单个基因组输入文件
///
/// 不变式：每个基因组最多对应一个注释输出子目录，目录名即 `stem`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeUnit {
    /// 文件名（含扩展名）
    pub file_name: String,
    /// 文件名主干，同时也是注释输出子目录名
    pub stem: String,
    /// 识别出的格式
    pub format: GenomeFormat,
}

impl GenomeUnit {
    pub fn new(file_name: impl Into<String>, format: GenomeFormat) -> Self {
        let file_name = file_name.into();
        let stem = Path::new(&file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.clone());
        Self {
            file_name,
            stem,
            format,
        }
    }

    /// 该基因组在批次输入目录下的完整路径
    pub fn input_path(&self, batch: &Batch) -> PathBuf {
        batch.input_dir().join(&self.file_name)
    }
}

/// 相似度阈值
///
/// 取值范围 (0, 1]，构造时校验。每个 cutoff 拥有互不重叠的输出子目录。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoff(f64);

impl Cutoff {
    pub fn new(value: f64) -> AppResult<Self> {
        if value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(AppError::Pipeline(PipelineError::InvalidCutoff { value }))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Display for Cutoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_range() {
        assert!(Cutoff::new(0.3).is_ok());
        assert!(Cutoff::new(1.0).is_ok());
        assert!(Cutoff::new(0.0).is_err());
        assert!(Cutoff::new(1.1).is_err());
        assert!(Cutoff::new(-0.5).is_err());
    }

    #[test]
    fn test_cutoff_dir_isolation() {
        let batch = Batch::new("/tmp/pipeline", "demo");
        let a = batch.cutoff_dir(Cutoff::new(0.3).unwrap());
        let b = batch.cutoff_dir(Cutoff::new(0.5).unwrap());
        assert_ne!(a, b);
        assert!(a.ends_with("bigscape/cutoff_0.3"));
        assert!(b.ends_with("bigscape/cutoff_0.5"));
    }

    #[test]
    fn test_genome_unit_stem() {
        let unit = GenomeUnit::new("GCF_000123.1.fna", GenomeFormat::Nucleotide);
        assert_eq!(unit.stem, "GCF_000123.1");
    }

    #[test]
    fn test_extension_map() {
        assert_eq!(
            EXTENSION_FORMATS.get("fna"),
            Some(&GenomeFormat::Nucleotide)
        );
        assert_eq!(EXTENSION_FORMATS.get("gbk"), Some(&GenomeFormat::Annotated));
        assert_eq!(
            EXTENSION_FORMATS.get("txt"),
            Some(&GenomeFormat::GenericText)
        );
        assert_eq!(EXTENSION_FORMATS.get("exe"), None);
    }
}
