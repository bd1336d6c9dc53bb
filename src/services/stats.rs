//! 统计汇总服务 - 业务能力层
//!
//! 把注释输出汇总成批次级 CSV 统计表。五个子阶段按固定顺序执行，
//! 每个子阶段只读取更早子阶段产出的表：
//!
//! 1. 主 BGC 表（扫描注释输出中的区域记录文件）
//! 2. 基因组级统计
//! 3. 批次级统计
//! 4. BGC 类型频次表
//! 5. 汇总目录
//!
//! 所有表都是纯派生数据：每次运行整体重建，从不增量修补。

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use crate::models::{
    Batch, BatchStatsRow, BgcRecord, CatalogRow, GenomeStatsRow, TypeCountRow,
};

/// 注释工具名，写入主表的 source_tool 列
const SOURCE_TOOL: &str = "antiSMASH";

/// 统计汇总服务
pub struct StatsService {
    region_file: Regex,
}

impl StatsService {
    pub fn new() -> Self {
        Self {
            // 注释输出的区域记录文件命名形如 <contig>.region001.gbk
            region_file: Regex::new(r"\.region(\d+)\.gbk$").expect("区域文件名正则必定有效"),
        }
    }

    // ========== 子阶段 1：主 BGC 表 ==========

    /// 扫描注释输出目录，构建主 BGC 表，返回写入的行数
    ///
    /// 无法解析的记录文件和没有 region 特征的记录直接跳过。
    pub fn build_master_table(&self, batch: &Batch) -> Result<usize> {
        let antismash_dir = batch.antismash_dir();
        let mut rows: Vec<BgcRecord> = Vec::new();

        let entries = fs::read_dir(&antismash_dir)
            .with_context(|| format!("无法读取注释输出目录: {}", antismash_dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let genome_dir = entry.path();
            if !genome_dir.is_dir() {
                continue;
            }
            let genome_id = entry.file_name().to_string_lossy().to_string();
            self.collect_genome_regions(batch.name(), &genome_id, &genome_dir, &mut rows)?;
        }

        let output = batch.master_table_path();
        let mut writer = csv::Writer::from_path(&output)
            .with_context(|| format!("无法写入主 BGC 表: {}", output.display()))?;
        // 即使没有任何区域也要写出表头，下游子阶段依赖这张表存在
        if rows.is_empty() {
            writer.write_record([
                "batch_id",
                "genome_id",
                "contig_id",
                "bgc_id",
                "region_number",
                "bgc_type",
                "bgc_start",
                "bgc_end",
                "bgc_length_bp",
                "source_tool",
            ])?;
        }
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        Ok(rows.len())
    }

    /// 收集单个基因组目录下的所有区域记录
    fn collect_genome_regions(
        &self,
        batch_id: &str,
        genome_id: &str,
        genome_dir: &Path,
        rows: &mut Vec<BgcRecord>,
    ) -> Result<()> {
        let mut region_files: Vec<(String, std::path::PathBuf)> = Vec::new();
        let entries = fs::read_dir(genome_dir)
            .with_context(|| format!("无法读取基因组目录: {}", genome_dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(caps) = self.region_file.captures(file_name) {
                region_files.push((caps[1].to_string(), path));
            }
        }
        region_files.sort();

        for (region_number, path) in region_files {
            let Some(record) = self.parse_region_record(&path) else {
                continue;
            };
            let (contig_id, start, end, bgc_type) = record;
            rows.push(BgcRecord {
                batch_id: batch_id.to_string(),
                genome_id: genome_id.to_string(),
                contig_id,
                bgc_id: format!("{}|region{}", genome_id, region_number),
                region_number,
                bgc_type,
                bgc_start: start,
                bgc_end: end,
                bgc_length_bp: end - start,
                source_tool: SOURCE_TOOL.to_string(),
            });
        }
        Ok(())
    }

    /// 解析单个区域记录文件，取第一个 region 特征
    ///
    /// 返回 (contig_id, start, end, bgc_type)；解析失败或没有 region
    /// 特征时返回 None（与上游一致，跳过而不是中止）。
    fn parse_region_record(&self, path: &Path) -> Option<(String, i64, i64, String)> {
        let seqs = match gb_io::reader::parse_file(path) {
            Ok(seqs) => seqs,
            Err(e) => {
                warn!("跳过无法解析的区域记录 {}: {}", path.display(), e);
                return None;
            }
        };
        let seq = seqs.into_iter().next()?;
        let contig_id = seq.name.clone().unwrap_or_default();

        let region = seq
            .features
            .iter()
            .find(|f| f.kind.to_string().eq_ignore_ascii_case("region"))?;
        let (start, end) = match region.location.find_bounds() {
            Ok(bounds) => bounds,
            Err(e) => {
                warn!("跳过区域坐标异常的记录 {}: {}", path.display(), e);
                return None;
            }
        };

        let products: Vec<String> = region
            .qualifier_values("product".into())
            .map(|v| v.to_string())
            .collect();
        let bgc_type = if products.is_empty() {
            "unknown".to_string()
        } else {
            products.join(";")
        };

        debug!(
            "区域 {}: {}..{} ({})",
            path.display(),
            start,
            end,
            bgc_type
        );
        Some((contig_id, start, end, bgc_type))
    }

    // ========== 子阶段 2：基因组级统计 ==========

    pub fn build_genome_stats(&self, batch: &Batch) -> Result<usize> {
        let records = self.read_master_table(batch)?;

        let mut genome_lengths: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        let mut genome_types: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for record in &records {
            genome_lengths
                .entry(record.genome_id.clone())
                .or_default()
                .push(record.bgc_length_bp);
            genome_types
                .entry(record.genome_id.clone())
                .or_default()
                .insert(record.bgc_type.clone());
        }

        let output = batch.genome_stats_path();
        let mut writer = csv::Writer::from_path(&output)
            .with_context(|| format!("无法写入基因组统计表: {}", output.display()))?;
        if genome_lengths.is_empty() {
            writer.write_record([
                "batch_id",
                "genome_id",
                "total_bgcs",
                "unique_bgc_types",
                "mean_bgc_length",
                "median_bgc_length",
                "min_bgc_length",
                "max_bgc_length",
            ])?;
        }
        let mut count = 0;
        for (genome_id, lengths) in &genome_lengths {
            let values: Vec<f64> = lengths.iter().map(|&v| v as f64).collect();
            writer.serialize(GenomeStatsRow {
                batch_id: batch.name().to_string(),
                genome_id: genome_id.clone(),
                total_bgcs: lengths.len(),
                unique_bgc_types: genome_types.get(genome_id).map_or(0, |t| t.len()),
                mean_bgc_length: round2(mean(&values)),
                median_bgc_length: round2(median(&values)),
                min_bgc_length: lengths.iter().copied().min().unwrap_or(0),
                max_bgc_length: lengths.iter().copied().max().unwrap_or(0),
            })?;
            count += 1;
        }
        writer.flush()?;
        Ok(count)
    }

    // ========== 子阶段 3：批次级统计 ==========

    pub fn build_batch_stats(&self, batch: &Batch) -> Result<usize> {
        let records = self.read_master_table(batch)?;

        let mut genome_bgcs: BTreeMap<String, usize> = BTreeMap::new();
        let mut bgc_lengths: Vec<f64> = Vec::new();
        let mut bgc_types: BTreeSet<String> = BTreeSet::new();
        for record in &records {
            *genome_bgcs.entry(record.genome_id.clone()).or_default() += 1;
            bgc_lengths.push(record.bgc_length_bp as f64);
            bgc_types.insert(record.bgc_type.clone());
        }

        let per_genome: Vec<f64> = genome_bgcs.values().map(|&v| v as f64).collect();
        let row = BatchStatsRow {
            batch_id: batch.name().to_string(),
            total_genomes: genome_bgcs.len(),
            total_bgcs: records.len(),
            mean_bgcs_per_genome: round2(mean(&per_genome)),
            median_bgcs_per_genome: round2(median(&per_genome)),
            unique_bgc_types: bgc_types.len(),
            mean_bgc_length: round2(mean(&bgc_lengths)),
        };

        let output = batch.batch_stats_path();
        let mut writer = csv::Writer::from_path(&output)
            .with_context(|| format!("无法写入批次统计表: {}", output.display()))?;
        writer.serialize(row)?;
        writer.flush()?;
        Ok(1)
    }

    // ========== 子阶段 4：BGC 类型频次表 ==========

    pub fn build_type_stats(&self, batch: &Batch) -> Result<usize> {
        let records = self.read_master_table(batch)?;

        let mut type_counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in &records {
            for raw in record.bgc_type.split(';') {
                let bgc_type = raw.trim();
                if bgc_type.is_empty() {
                    continue;
                }
                *type_counts.entry(bgc_type.to_string()).or_default() += 1;
            }
        }

        // 频次降序，同频按类型名排序保证输出稳定
        let mut ordered: Vec<(String, usize)> = type_counts.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let output = batch.type_stats_path();
        let mut writer = csv::Writer::from_path(&output)
            .with_context(|| format!("无法写入类型频次表: {}", output.display()))?;
        if ordered.is_empty() {
            writer.write_record(["batch_id", "bgc_type", "count"])?;
        }
        let count = ordered.len();
        for (bgc_type, type_count) in ordered {
            writer.serialize(TypeCountRow {
                batch_id: batch.name().to_string(),
                bgc_type,
                count: type_count,
            })?;
        }
        writer.flush()?;
        Ok(count)
    }

    // ========== 子阶段 5：汇总目录 ==========

    pub fn build_catalog(&self, batch: &Batch) -> Result<usize> {
        let records = self.read_master_table(batch)?;

        let output = batch.catalog_path();
        let mut writer = csv::Writer::from_path(&output)
            .with_context(|| format!("无法写入汇总目录: {}", output.display()))?;
        if records.is_empty() {
            writer.write_record([
                "batch_id",
                "genome_id",
                "contig_id",
                "bgc_id",
                "region_number",
                "bgc_type",
                "bgc_length_bp",
                "bgc_start",
                "bgc_end",
            ])?;
        }
        for record in &records {
            writer.serialize(CatalogRow {
                batch_id: record.batch_id.clone(),
                genome_id: record.genome_id.clone(),
                contig_id: record.contig_id.clone(),
                bgc_id: record.bgc_id.clone(),
                region_number: record.region_number.clone(),
                bgc_type: record.bgc_type.clone(),
                bgc_length_bp: record.bgc_length_bp,
                bgc_start: record.bgc_start,
                bgc_end: record.bgc_end,
            })?;
        }
        writer.flush()?;
        Ok(records.len())
    }

    /// 读取主 BGC 表（后续子阶段的唯一输入）
    fn read_master_table(&self, batch: &Batch) -> Result<Vec<BgcRecord>> {
        let path = batch.master_table_path();
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("无法读取主 BGC 表: {}", path.display()))?;
        let mut records = Vec::new();
        for record in reader.deserialize() {
            records.push(record?);
        }
        Ok(records)
    }
}

impl Default for StatsService {
    fn default() -> Self {
        Self::new()
    }
}

// ========== 数值辅助函数 ==========

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
