//! 流水线集成测试
//!
//! 用一个可执行的桩脚本冒充容器运行时：桩把每次调用的完整参数追加到
//! 调用日志，并按参数内容模拟注释/聚类工具的各种退出方式。这样不依赖
//! 本机 docker 就能验证三阶段编排、幂等跳过、致命中止与可容忍继续。
//!
//! 需要真实 docker 的冒烟测试带 #[ignore]，手动运行：
//! cargo test --test pipeline_test -- --ignored

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bgc_pipeline::models::Cutoff;
use bgc_pipeline::services::Observer;
use bgc_pipeline::{App, AppError, Config, PipelineError};

/// 一套隔离的流水线目录 + 桩运行时
struct TestPipeline {
    _dir: tempfile::TempDir,
    root: PathBuf,
    invocation_log: PathBuf,
    config: Config,
}

/// 桩脚本片段：解析 -v 挂载、取得最后一个参数，并在注释调用时
/// 在宿主侧创建 /output/<stem> 对应的目录（模拟注释工具的产出）
const ANTISMASH_CREATES_OUTPUT: &str = r#"
OUT_HOST=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-v" ]; then
    case "$a" in
      *:/output) OUT_HOST="${a%:/output}" ;;
    esac
  fi
  prev="$a"
done
for a in "$@"; do last="$a"; done
case "$*" in
  *antismash/standalone*)
    stem="${last#/output/}"
    mkdir -p "$OUT_HOST/$stem"
    exit 0
    ;;
esac
"#;

fn setup(stub_body: &str, genomes: &[(&str, &str)]) -> TestPipeline {
    let dir = tempfile::tempdir().expect("无法创建临时目录");
    let root = dir.path().to_path_buf();

    let input_dir = root.join("batches/demo/input");
    fs::create_dir_all(&input_dir).expect("无法创建输入目录");
    for (name, content) in genomes {
        fs::write(input_dir.join(name), content).expect("无法写入基因组文件");
    }

    let invocation_log = root.join("invocations.log");
    let stub_path = root.join("stub_runtime.sh");
    let script = format!(
        "#!/bin/sh\necho \"$@\" >> \"{}\"\nif [ \"$1\" = \"version\" ]; then exit 0; fi\n{}\nexit 0\n",
        invocation_log.display(),
        stub_body
    );
    fs::write(&stub_path, script).expect("无法写入桩脚本");
    let mut perms = fs::metadata(&stub_path).expect("无法读取桩脚本元数据").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&stub_path, perms).expect("无法设置桩脚本可执行位");

    let config = Config {
        pipeline_root: root.to_string_lossy().to_string(),
        container_runtime: stub_path.to_string_lossy().to_string(),
        ..Config::default()
    };

    TestPipeline {
        _dir: dir,
        root,
        invocation_log,
        config,
    }
}

fn count_invocations(log: &Path, needle: &str) -> usize {
    match fs::read_to_string(log) {
        Ok(content) => content.lines().filter(|l| l.contains(needle)).count(),
        Err(_) => 0,
    }
}

fn session_log(pipeline: &TestPipeline) -> String {
    fs::read_to_string(pipeline.root.join("batches/demo/session_log.txt")).unwrap_or_default()
}

fn cutoffs(values: &[f64]) -> Vec<Cutoff> {
    values
        .iter()
        .map(|v| Cutoff::new(*v).expect("测试 cutoff 应该合法"))
        .collect()
}

#[tokio::test]
async fn test_full_pipeline_scenario() {
    let pipeline = setup(
        &format!("{}\ncase \"$*\" in *big-scape*) exit 0 ;; esac", ANTISMASH_CREATES_OUTPUT),
        &[("a.fna", ">contig1\nATGC\n"), ("b.fna", ">contig1\nGGCC\n")],
    );

    let mut app = App::initialize(pipeline.config.clone())
        .await
        .expect("桩运行时就绪探测应该通过");
    app.run_batch("demo", &cutoffs(&[0.3, 0.7]), None)
        .await
        .expect("完整流水线应该成功");

    // 每个基因组一次注释调用，每个 cutoff 一次聚类调用
    assert_eq!(count_invocations(&pipeline.invocation_log, "antismash/standalone"), 2);
    assert_eq!(count_invocations(&pipeline.invocation_log, "big-scape"), 2);

    // 注释全部先于聚类
    let log = fs::read_to_string(&pipeline.invocation_log).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    let last_annotation = lines
        .iter()
        .rposition(|l| l.contains("antismash/standalone"))
        .unwrap();
    let first_clustering = lines.iter().position(|l| l.contains("big-scape")).unwrap();
    assert!(last_annotation < first_clustering);

    // 五张统计表齐全
    let batch_dir = pipeline.root.join("batches/demo");
    for table in [
        "master_bgc_antismash.csv",
        "genome_bgc_stats.csv",
        "batch_bgc_stats.csv",
        "bgc_type_stats.csv",
        "bgc_catalog.csv",
    ] {
        assert!(batch_dir.join(table).exists(), "缺少统计表 {}", table);
    }

    // 每个 cutoff 有专属输出子目录
    assert!(batch_dir.join("bigscape/cutoff_0.3").is_dir());
    assert!(batch_dir.join("bigscape/cutoff_0.7").is_dir());

    assert!(session_log(&pipeline).contains("全部处理完成"));
}

#[tokio::test]
async fn test_rerun_skips_annotated_genomes() {
    let pipeline = setup(
        &format!("{}\ncase \"$*\" in *big-scape*) exit 0 ;; esac", ANTISMASH_CREATES_OUTPUT),
        &[("a.fna", ">contig1\nATGC\n"), ("b.fna", ">contig1\nGGCC\n")],
    );

    let mut app = App::initialize(pipeline.config.clone()).await.unwrap();
    app.run_batch("demo", &cutoffs(&[0.3]), None)
        .await
        .expect("首次运行应该成功");
    app.run_batch("demo", &cutoffs(&[0.3]), None)
        .await
        .expect("重复运行应该成功");

    // 第二次运行不再发出任何注释调用
    assert_eq!(count_invocations(&pipeline.invocation_log, "antismash/standalone"), 2);
    assert!(session_log(&pipeline).contains("跳过"));
}

#[tokio::test]
async fn test_fatal_annotation_halts_remaining_genomes() {
    let pipeline = setup(
        "case \"$*\" in *a.fna*) echo \"annotation exploded\" >&2; exit 1 ;; esac",
        &[("a.fna", ">contig1\nATGC\n"), ("b.fna", ">contig1\nGGCC\n")],
    );

    let mut app = App::initialize(pipeline.config.clone()).await.unwrap();
    let result = app.run_batch("demo", &cutoffs(&[0.3]), None).await;
    assert!(result.is_err(), "注释失败应该中止整个批次");

    // 排在后面的基因组一律不再调用，后续阶段也不开始
    assert_eq!(count_invocations(&pipeline.invocation_log, "b.fna"), 0);
    assert_eq!(count_invocations(&pipeline.invocation_log, "big-scape"), 0);
    assert!(!pipeline.root.join("batches/demo/master_bgc_antismash.csv").exists());
}

#[tokio::test]
async fn test_tolerated_clustering_continues_remaining_cutoffs() {
    let pipeline = setup(
        &format!(
            "{}\ncase \"$*\" in *big-scape*) echo \"No aligned sequences found\" >&2; exit 1 ;; esac",
            ANTISMASH_CREATES_OUTPUT
        ),
        &[("a.fna", ">contig1\nATGC\n")],
    );

    let mut app = App::initialize(pipeline.config.clone()).await.unwrap();
    app.run_batch("demo", &cutoffs(&[0.3, 0.7]), None)
        .await
        .expect("可容忍的聚类失败不应中止批次");

    // 两个 cutoff 都被尝试，各自的输出子目录互不重叠
    assert_eq!(count_invocations(&pipeline.invocation_log, "big-scape"), 2);
    assert_eq!(count_invocations(&pipeline.invocation_log, "cutoff_0.3"), 1);
    assert_eq!(count_invocations(&pipeline.invocation_log, "cutoff_0.7"), 1);
    assert!(pipeline.root.join("batches/demo/bigscape/cutoff_0.3").is_dir());
    assert!(pipeline.root.join("batches/demo/bigscape/cutoff_0.7").is_dir());
    assert!(session_log(&pipeline).contains("可容忍"));
}

#[tokio::test]
async fn test_aggregation_failure_aborts_before_clustering() {
    let pipeline = setup(
        &format!("{}\ncase \"$*\" in *big-scape*) exit 0 ;; esac", ANTISMASH_CREATES_OUTPUT),
        &[("a.fna", ">contig1\nATGC\n")],
    );
    // 用同名目录占住主表路径，迫使第一个统计汇总子阶段写表失败
    fs::create_dir_all(pipeline.root.join("batches/demo/master_bgc_antismash.csv")).unwrap();

    let mut app = App::initialize(pipeline.config.clone()).await.unwrap();
    let err = app
        .run_batch("demo", &cutoffs(&[0.3]), None)
        .await
        .expect_err("统计汇总失败应该中止批次");
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Pipeline(PipelineError::AggregationFailed { .. }))
    ));

    // 聚类阶段不再开始，失败在传播前已写入会话日志
    assert_eq!(count_invocations(&pipeline.invocation_log, "big-scape"), 0);
    assert!(session_log(&pipeline).contains("统计汇总失败"));
}

#[tokio::test]
async fn test_unclassified_clustering_failure_is_fatal() {
    let pipeline = setup(
        &format!(
            "{}\ncase \"$*\" in *big-scape*) echo \"Segmentation fault\" >&2; exit 1 ;; esac",
            ANTISMASH_CREATES_OUTPUT
        ),
        &[("a.fna", ">contig1\nATGC\n")],
    );

    let mut app = App::initialize(pipeline.config.clone()).await.unwrap();
    let result = app.run_batch("demo", &cutoffs(&[0.3, 0.7]), None).await;
    let err = result.expect_err("未分类的聚类失败应该中止批次");
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Pipeline(PipelineError::ClusteringFailed { .. }))
    ));

    // 第一个 cutoff 致命失败后，第二个 cutoff 不再尝试
    assert_eq!(count_invocations(&pipeline.invocation_log, "big-scape"), 1);
    assert_eq!(count_invocations(&pipeline.invocation_log, "cutoff_0.7"), 0);
}

#[tokio::test]
async fn test_empty_cutoff_set_is_rejected_upfront() {
    let pipeline = setup("", &[("a.fna", ">contig1\nATGC\n")]);

    let mut app = App::initialize(pipeline.config.clone()).await.unwrap();
    let err = app
        .run_batch("demo", &[], None)
        .await
        .expect_err("空 cutoff 集应该在任何阶段开始前被拒绝");
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Pipeline(PipelineError::EmptyCutoffs))
    ));

    // 连注释阶段都没有开始
    assert_eq!(count_invocations(&pipeline.invocation_log, "antismash/standalone"), 0);
}

#[tokio::test]
async fn test_non_sequence_text_file_is_rejected_untouched() {
    let pipeline = setup(
        &format!("{}\ncase \"$*\" in *big-scape*) exit 0 ;; esac", ANTISMASH_CREATES_OUTPUT),
        &[
            ("a.fna", ">contig1\nATGC\n"),
            ("notes.txt", "实验记录，不是序列\n"),
        ],
    );

    let mut app = App::initialize(pipeline.config.clone()).await.unwrap();
    app.run_batch("demo", &cutoffs(&[0.3]), None)
        .await
        .expect("被拒绝的文本文件不应中止批次");

    // 被拒绝的文件原样留在输入目录，未改名、未注释
    let input_dir = pipeline.root.join("batches/demo/input");
    assert!(input_dir.join("notes.txt").exists());
    assert_eq!(count_invocations(&pipeline.invocation_log, "notes"), 0);
    assert_eq!(count_invocations(&pipeline.invocation_log, "antismash/standalone"), 1);
    assert!(session_log(&pipeline).contains("已拒绝"));
}

#[tokio::test]
async fn test_observer_receives_ordered_progress_messages() {
    let pipeline = setup(
        &format!("{}\ncase \"$*\" in *big-scape*) exit 0 ;; esac", ANTISMASH_CREATES_OUTPUT),
        &[("a.fna", ">contig1\nATGC\n")],
    );

    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let seen_clone = seen.clone();
    let observer: Observer = Box::new(move |msg| {
        seen_clone.lock().unwrap().push(msg.to_string());
    });

    let mut app = App::initialize(pipeline.config.clone()).await.unwrap();
    app.run_batch("demo", &cutoffs(&[0.3]), Some(observer))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.first().unwrap().contains("开始处理批次"));
    assert!(seen.last().unwrap().contains("全部处理完成"));
    // 观察者消息与会话日志一致
    let log = session_log(&pipeline);
    for msg in seen.iter() {
        assert!(log.contains(msg.as_str()), "会话日志缺少消息: {}", msg);
    }
}

#[tokio::test]
async fn test_unavailable_runtime_fails_initialization() {
    let config = Config {
        container_runtime: "/nonexistent/docker-binary".to_string(),
        ..Config::default()
    };
    let result = App::initialize(config).await;
    assert!(result.is_err(), "运行时不可用时初始化应该失败");
}

#[tokio::test]
#[ignore] // 需要本机 docker 和已拉取的 antismash/standalone、nselem/big-scape 镜像
async fn test_real_docker_smoke() {
    let app = App::initialize(Config::default()).await;
    assert!(app.is_ok(), "本机 docker 就绪探测失败");
}
