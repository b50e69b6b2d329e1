//! 配置处理基准测试
//!
//! 测试配置解析、验证和目标解析的性能

use criterion::{criterion_group, criterion_main, Criterion};
use pinger::config::{validate_config, Config};
use std::hint::black_box;

const CONFIG_TOML: &str = r#"
[global]
concurrency = 20
timeout_seconds = 3
log_level = "info"

[global.headers]
"User-Agent" = "pinger-bench"

[[targets]]
name = "api"
url = "https://api.internal/health"
expected_status = 204

[targets.headers]
Authorization = "Bearer token"

[[targets]]
name = "postgres"
url = "db.internal:5432"
type = "tcp"
timeout_seconds = 1

[[targets]]
url = "internal.example"
type = "dns"
"#;

/// 配置处理基准测试
fn config_processing_benchmark(c: &mut Criterion) {
    c.bench_function("config_deserialization", |b| {
        b.iter(|| {
            let config: Config = toml::from_str(black_box(CONFIG_TOML)).unwrap();
            black_box(config)
        });
    });

    let config: Config = toml::from_str(CONFIG_TOML).unwrap();

    c.bench_function("config_validation", |b| {
        b.iter(|| black_box(validate_config(&config)));
    });

    c.bench_function("target_resolution", |b| {
        b.iter(|| black_box(config.targets()));
    });

    c.bench_function("config_serialization", |b| {
        b.iter(|| {
            let toml = toml::to_string(&config).unwrap();
            black_box(toml)
        });
    });
}

criterion_group!(benches, config_processing_benchmark);
criterion_main!(benches);
