//! Benchmarks for segmentlog append and read paths

use std::io::Read;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use segmentlog::{Config, Log, Record};
use tempfile::TempDir;

const RECORD_SIZE: usize = 256;
const RECORDS: u64 = 1_000;

fn bench_config() -> Config {
    Config::builder()
        .max_store_bytes(64 * 1024 * 1024)
        .max_index_bytes(1024 * 1024)
        .build()
}

fn filled_log(dir: &TempDir) -> Log {
    let log = Log::open(dir.path(), bench_config()).unwrap();
    for _ in 0..RECORDS {
        log.append(&mut Record::new(vec![0xAB; RECORD_SIZE])).unwrap();
    }
    log
}

fn log_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("log");
    group.throughput(Throughput::Bytes(RECORD_SIZE as u64));

    // Sequential append into one large segment
    group.bench_function("append", |b| {
        let dir = TempDir::new().unwrap();
        let log = Log::open(dir.path(), bench_config()).unwrap();
        b.iter(|| {
            let mut record = Record::new(vec![0xAB; RECORD_SIZE]);
            black_box(log.append(&mut record).unwrap())
        });
    });

    // Rotation-heavy append: small segments
    group.bench_function("append_rotating", |b| {
        b.iter_batched(
            || {
                let dir = TempDir::new().unwrap();
                let config = Config::builder().max_store_bytes(16 * 1024).build();
                let log = Log::open(dir.path(), config).unwrap();
                (dir, log)
            },
            |(_dir, log)| {
                for _ in 0..100 {
                    log.append(&mut Record::new(vec![0xAB; RECORD_SIZE])).unwrap();
                }
            },
            BatchSize::PerIteration,
        );
    });

    // Random-ish reads across the written range
    group.bench_function("read", |b| {
        let dir = TempDir::new().unwrap();
        let log = filled_log(&dir);
        let mut off = 0u64;
        b.iter(|| {
            off = (off + 7919) % RECORDS;
            black_box(log.read(off).unwrap())
        });
    });

    group.finish();

    c.bench_function("stream_full_log", |b| {
        let dir = TempDir::new().unwrap();
        let log = filled_log(&dir);
        b.iter(|| {
            let mut bytes = Vec::new();
            log.reader().read_to_end(&mut bytes).unwrap();
            black_box(bytes.len())
        });
    });
}

criterion_group!(benches, log_benchmarks);
criterion_main!(benches);
