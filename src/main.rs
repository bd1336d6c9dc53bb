use anyhow::{bail, Result};

use bgc_pipeline::models::Cutoff;
use bgc_pipeline::utils::logging;
use bgc_pipeline::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 解析命令行：<批次名> [cutoff ...]
    let mut args = std::env::args().skip(1);
    let batch_name = match args.next() {
        Some(name) => name,
        None => bail!("用法: bgc_pipeline <批次名> [cutoff ...]"),
    };
    let cutoffs = parse_cutoffs(args)?;

    // 初始化并运行应用
    let mut app = App::initialize(config).await?;
    app.run_batch(&batch_name, &cutoffs, None).await?;

    Ok(())
}

/// 未指定时使用默认 cutoff 集 0.3 / 0.5 / 0.7
fn parse_cutoffs(args: impl Iterator<Item = String>) -> Result<Vec<Cutoff>> {
    let raw: Vec<String> = args.collect();
    if raw.is_empty() {
        return Ok(vec![
            Cutoff::new(0.3)?,
            Cutoff::new(0.5)?,
            Cutoff::new(0.7)?,
        ]);
    }

    let mut cutoffs = Vec::with_capacity(raw.len());
    for value in raw {
        let parsed: f64 = value
            .parse()
            .map_err(|_| anyhow::anyhow!("无法解析 cutoff: {}", value))?;
        cutoffs.push(Cutoff::new(parsed)?);
    }
    Ok(cutoffs)
}
