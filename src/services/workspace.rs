//! 批次工作区服务 - 业务能力层
//!
//! 只负责批次目录与文件清单的维护，不执行任何外部进程，不关心流程顺序。

use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{AppError, AppResult, WorkspaceError};
use crate::models::{Batch, Cutoff, GenomeFormat, GenomeUnit, EXTENSION_FORMATS};

/// 基因组清单扫描结果
///
/// `rejected` 中的文件未通过内容嗅探，已被排除在清单之外，
/// 由编排层负责逐一上报（拒绝不能无声发生）。
#[derive(Debug, Default)]
pub struct GenomeInventory {
    pub units: Vec<GenomeUnit>,
    pub rejected: Vec<String>,
}

/// 批次工作区服务
pub struct WorkspaceService;

impl WorkspaceService {
    pub fn new() -> Self {
        Self
    }

    /// 扫描输入目录，返回按文件名排序的基因组清单
    ///
    /// - 输入目录不存在 → `InputDirNotFound`
    /// - 没有可识别的文件 → `NoGenomeFiles`
    /// - `.txt` 文件先做内容嗅探（首个非空行必须以 `>` 开头），
    ///   通过后就地改名为 `.fasta`；未通过的进入 `rejected`，绝不改名
    pub fn list_genome_units(&self, batch: &Batch) -> AppResult<GenomeInventory> {
        let input_dir = batch.input_dir();
        if !input_dir.is_dir() {
            return Err(AppError::Workspace(WorkspaceError::InputDirNotFound {
                path: input_dir.display().to_string(),
            }));
        }

        let mut inventory = GenomeInventory::default();

        let entries = fs::read_dir(&input_dir)
            .map_err(|e| AppError::workspace_io(input_dir.display().to_string(), e))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| AppError::workspace_io(input_dir.display().to_string(), e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let extension = path
                .extension()
                .and_then(|s| s.to_str())
                .map(|s| s.to_ascii_lowercase())
                .unwrap_or_default();
            let Some(format) = EXTENSION_FORMATS.get(extension.as_str()) else {
                debug!("忽略无法识别的文件: {}", path.display());
                continue;
            };

            let file_name = entry.file_name().to_string_lossy().to_string();
            match format {
                GenomeFormat::GenericText => match self.normalize_text_file(&path)? {
                    Some(unit) => inventory.units.push(unit),
                    None => inventory.rejected.push(file_name),
                },
                _ => inventory.units.push(GenomeUnit::new(file_name, *format)),
            }
        }

        if inventory.units.is_empty() {
            return Err(AppError::Workspace(WorkspaceError::NoGenomeFiles {
                path: input_dir.display().to_string(),
            }));
        }

        inventory.units.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(inventory)
    }

    /// 嗅探 `.txt` 文件内容，合格则就地归一化为 `.fasta`
    ///
    /// 返回 `Ok(None)` 表示文件被拒绝（首个非空行不以 `>` 开头），
    /// 此时文件保持原样，不做任何改名。
    fn normalize_text_file(&self, path: &PathBuf) -> AppResult<Option<GenomeUnit>> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::workspace_io(path.display().to_string(), e))?;

        let first_line = content.lines().find(|line| !line.trim().is_empty());
        let looks_like_fasta = matches!(first_line, Some(line) if line.trim_start().starts_with('>'));
        if !looks_like_fasta {
            warn!("文件内容不是序列记录，已拒绝: {}", path.display());
            return Ok(None);
        }

        let normalized = path.with_extension("fasta");
        fs::rename(path, &normalized)
            .map_err(|e| AppError::workspace_io(path.display().to_string(), e))?;
        debug!("已归一化: {} → {}", path.display(), normalized.display());

        let file_name = normalized
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Some(GenomeUnit::new(file_name, GenomeFormat::Nucleotide)))
    }

    /// 注释输出是否已存在
    ///
    /// 注释阶段幂等性的唯一信号：以 stem 命名的子目录是否存在。
    /// 不校验目录内容，被中途杀死的上次运行会被当作已完成（已知局限）。
    pub fn annotation_output_exists(&self, batch: &Batch, unit: &GenomeUnit) -> bool {
        batch.antismash_dir().join(&unit.stem).is_dir()
    }

    /// 创建阶段输出目录（幂等，已存在不报错）
    pub fn ensure_output_directories(&self, batch: &Batch) -> AppResult<()> {
        for dir in [batch.antismash_dir(), batch.bigscape_dir()] {
            fs::create_dir_all(&dir)
                .map_err(|e| AppError::workspace_io(dir.display().to_string(), e))?;
        }
        Ok(())
    }

    /// 创建某个 cutoff 专属的输出子目录（幂等），返回其路径
    pub fn ensure_cutoff_directory(&self, batch: &Batch, cutoff: Cutoff) -> AppResult<PathBuf> {
        let dir = batch.cutoff_dir(cutoff);
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::workspace_io(dir.display().to_string(), e))?;
        Ok(dir)
    }

    /// 删除整个批次（递归、不可逆）
    pub fn delete_batch(&self, batch: &Batch) -> AppResult<()> {
        if !batch.dir().exists() {
            return Err(AppError::Workspace(WorkspaceError::BatchNotFound {
                path: batch.dir().display().to_string(),
            }));
        }
        fs::remove_dir_all(batch.dir())
            .map_err(|e| AppError::workspace_io(batch.dir().display().to_string(), e))?;
        Ok(())
    }
}

impl Default for WorkspaceService {
    fn default() -> Self {
        Self::new()
    }
}
