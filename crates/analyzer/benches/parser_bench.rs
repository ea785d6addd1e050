//! 라인 분류/집계 벤치마크
//!
//! 다섯 가지 문법의 분류 처리량과 요약 집계 비용을 측정합니다.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use killtrace_analyzer::builder::TimeRange;
use killtrace_analyzer::config::AnalyzerConfig;
use killtrace_analyzer::parser::LineClassifier;
use killtrace_analyzer::LogAnalyzer;

/// lowmemorykiller 킬 라인
const LMK_LINE: &str = "12-01 10:00:00.123 1000 2000 I lowmemorykiller: \
    Kill 'com.example.app' (pid 1234) oom_score_adj 901, to free 51200kB, reason lowmem";

/// killinfo 19필드 신형 라인
const KILLINFO_LINE: &str = "12-01 10:00:02.000 1000 2000 I killinfo: \
    [com.example.app,1234,10001,901,900,51200,120,3,5993904,123456,234567,345678,0,1,1.2,0.5,0.3,0.1,0.9]";

/// 통합 킬러 3브래킷 라인
const KILL_KI_LINE: &str = "12-01 10:00:05.000 1000 2000 I killer  : \
    [kill|2|-900|15|3|1|0|2|350000|120000|51200]\
    [com.example.app|10001|1234|901|905|51200|1024|0|1|0]\
    [123456|234567|345678|45678|56789|7890]";

/// am_kill 라인
const AM_KILL_LINE: &str =
    "12-01 10:00:06.000 am_kill : [10001,1234,com.example.app,901,cached-empty,51200]";

/// 어느 문법에도 안 걸리는 노이즈 라인
const NOISE_LINE: &str = "12-01 10:00:07.000 1000 2000 D ActivityTaskManager: ordinary chatter";

fn bench_classify(c: &mut Criterion) {
    let config = AnalyzerConfig::new();
    let classifier = LineClassifier::new(&config);

    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(1));
    group.bench_function("lmk", |b| {
        b.iter(|| classifier.classify(black_box(LMK_LINE)))
    });
    group.bench_function("killinfo", |b| {
        b.iter(|| classifier.classify(black_box(KILLINFO_LINE)))
    });
    group.bench_function("kill_ki", |b| {
        b.iter(|| classifier.classify(black_box(KILL_KI_LINE)))
    });
    group.bench_function("am_kill", |b| {
        b.iter(|| classifier.classify(black_box(AM_KILL_LINE)))
    });
    // 노이즈는 전 패턴을 다 타고 떨어지는 최악 경로
    group.bench_function("noise_miss", |b| {
        b.iter(|| classifier.classify(black_box(NOISE_LINE)))
    });
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let analyzer = LogAnalyzer::new();
    let lines: Vec<&str> = [LMK_LINE, KILLINFO_LINE, KILL_KI_LINE, AM_KILL_LINE, NOISE_LINE]
        .into_iter()
        .cycle()
        .take(1000)
        .collect();

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(1000));
    group.bench_function("parse_1000_lines", |b| {
        b.iter(|| analyzer.parse_lines(black_box(lines.iter().copied()), &TimeRange::default()))
    });

    let events = analyzer.parse_lines(lines.iter().copied(), &TimeRange::default());
    group.bench_function("summarize", |b| {
        b.iter(|| analyzer.summarize(black_box(&events)))
    });
    group.finish();
}

criterion_group!(benches, bench_classify, bench_pipeline);
criterion_main!(benches);
