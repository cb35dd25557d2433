// ==========================================
// 车队批量导入系统 - 命令行入口
// ==========================================
// 用途: 选择映射档案,扫描待处理目录,执行导入管道
// 流程: 配置物化 → 目录缓存加载 → 逐文件处理 → 汇总
// ==========================================

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use fleet_loader::catalog::CatalogCache;
use fleet_loader::client::FleetApiClient;
use fleet_loader::config::AppConfig;
use fleet_loader::engine::{
    BatchSubmitter, FuelCardMapper, HttpSubmitter, InsuranceMapper, LoadOrchestrator,
    ReminderMapper, RowMapper, ScheduledExpenseMapper,
};
use fleet_loader::logging;
use fleet_loader::report::ResultReporter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "fleet-loader", about = "车队表格数据批量导入")]
struct Args {
    /// 映射档案(决定表头口径与目标端点)
    #[arg(long, value_enum)]
    profile: Profile,

    /// 输入文件或目录(默认: 配置的待处理目录)
    #[arg(long)]
    input: Option<PathBuf>,

    /// 试运行: 只映射与对账,不提交远端
    #[arg(long, default_value = "false")]
    dry_run: bool,

    /// 燃油卡档案的对账单供应商名
    #[arg(long)]
    supplier: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Profile {
    FuelCard,
    ScheduledExpense,
    Reminder,
    Insurance,
}

fn build_mapper(profile: Profile, supplier: Option<String>) -> Box<dyn RowMapper> {
    match profile {
        Profile::FuelCard => Box::new(FuelCardMapper::new(supplier)),
        Profile::ScheduledExpense => Box::new(ScheduledExpenseMapper::new()),
        Profile::Reminder => Box::new(ReminderMapper::new()),
        Profile::Insurance => Box::new(InsuranceMapper::new()),
    }
}

/// 收集待处理文件(单文件原样返回,目录按扩展名过滤并排序)
fn collect_input_files(input: &PathBuf) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.clone()]);
    }
    if !input.is_dir() {
        bail!("输入路径不存在: {}", input.display());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(input)
        .with_context(|| format!("目录读取失败: {}", input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("csv") | Some("xls") | Some("xlsx")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let config = AppConfig::from_env().context("配置物化失败")?;

    info!("==================================================");
    info!("{} v{}", fleet_loader::APP_NAME, fleet_loader::VERSION);
    info!("==================================================");

    let input = args.input.clone().unwrap_or(config.dirs.pending.clone());
    let files = collect_input_files(&input)?;
    if files.is_empty() {
        warn!(dir = %input.display(), "没有待处理文件,检查待处理目录");
        return Ok(());
    }
    info!(count = files.len(), "发现待处理文件");

    let mapper = build_mapper(args.profile, args.supplier.clone());

    // 目录缓存: 每次运行加载一次,失败即终止(无目录则无安全映射)
    let client = Arc::new(FleetApiClient::new(&config.api)?);
    let cache = CatalogCache::load(&client, mapper.catalog_kinds())
        .await
        .context("目录缓存加载失败")?;

    let orchestrator = LoadOrchestrator::new(
        mapper,
        BatchSubmitter::new(config.submit.concurrency, config.submit.pacing()),
        ResultReporter::new(&config.dirs.processed, &config.dirs.error),
        Arc::new(HttpSubmitter::new(client.clone())),
    );

    let mut total_processed = 0usize;
    let mut total_mapping_errors = 0usize;
    let mut total_submission_errors = 0usize;

    for (idx, file) in files.iter().enumerate() {
        info!(
            file = %file.display(),
            progress = format!("{}/{}", idx + 1, files.len()),
            "处理文件"
        );
        let report = orchestrator.run_file(file, &cache, args.dry_run).await?;
        total_processed += report.summary.processed;
        total_mapping_errors += report.summary.mapping_errors;
        total_submission_errors += report.summary.submission_errors;
    }

    info!("==================================================");
    info!(
        processed = total_processed,
        mapping_errors = total_mapping_errors,
        submission_errors = total_submission_errors,
        dry_run = args.dry_run,
        "全部文件处理完成"
    );

    Ok(())
}
