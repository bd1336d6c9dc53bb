//! 统计表行模型
//!
//! 所有行都是纯派生数据：每次统计汇总整体重建，从不增量修补。
//! 字段顺序即 CSV 列顺序。

use serde::{Deserialize, Serialize};

/// 主 BGC 表的一行（每个检测到的区域一行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BgcRecord {
    pub batch_id: String,
    pub genome_id: String,
    pub contig_id: String,
    pub bgc_id: String,
    pub region_number: String,
    pub bgc_type: String,
    pub bgc_start: i64,
    pub bgc_end: i64,
    pub bgc_length_bp: i64,
    pub source_tool: String,
}

/// 基因组级统计行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeStatsRow {
    pub batch_id: String,
    pub genome_id: String,
    pub total_bgcs: usize,
    pub unique_bgc_types: usize,
    pub mean_bgc_length: f64,
    pub median_bgc_length: f64,
    pub min_bgc_length: i64,
    pub max_bgc_length: i64,
}

/// 批次级统计行（每批次一行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatsRow {
    pub batch_id: String,
    pub total_genomes: usize,
    pub total_bgcs: usize,
    pub mean_bgcs_per_genome: f64,
    pub median_bgcs_per_genome: f64,
    pub unique_bgc_types: usize,
    pub mean_bgc_length: f64,
}

/// BGC 类型频次行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeCountRow {
    pub batch_id: String,
    pub bgc_type: String,
    pub count: usize,
}

/// 汇总目录行（主表的列序重排投影）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRow {
    pub batch_id: String,
    pub genome_id: String,
    pub contig_id: String,
    pub bgc_id: String,
    pub region_number: String,
    pub bgc_type: String,
    pub bgc_length_bp: i64,
    pub bgc_start: i64,
    pub bgc_end: i64,
}
