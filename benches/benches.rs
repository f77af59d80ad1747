use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use larder::{CacheSettings, TtlCache};

fn settings() -> CacheSettings {
    // The benchmarks run without a tokio runtime, so the reaper stays off...
    CacheSettings::new().with_polling_interval(Duration::ZERO)
}

fn read_benchmarks(c: &mut Criterion) {
    c.bench_function("read a hot entry", |b| {
        let cache = TtlCache::new(settings());
        cache.put("hot", 42).unwrap();

        b.iter(|| {
            black_box(cache.get(black_box(&"hot")).unwrap());
        })
    });

    c.bench_function("read a missing entry", |b| {
        let cache: TtlCache<&'static str, i32> = TtlCache::new(settings());

        b.iter(|| {
            black_box(cache.try_get(black_box(&"missing")).unwrap());
        })
    });
}

fn write_benchmarks(c: &mut Criterion) {
    c.bench_function("overwrite a single entry", |b| {
        let cache = TtlCache::new(settings());

        b.iter(|| {
            cache.put(black_box("key"), black_box(1)).unwrap();
        })
    });

    c.bench_function("insert under capacity pressure", |b| {
        let cache = TtlCache::new(settings().with_capacity(512));
        let mut next = 0_u64;

        // Every insert beyond the capacity forces an eviction scan...
        b.iter(|| {
            next += 1;
            cache.put(black_box(next), black_box(next)).unwrap();
        })
    });
}

fn sweep_benchmarks(c: &mut Criterion) {
    c.bench_function("sweep without expired entries", |b| {
        let cache = TtlCache::new(settings().with_capacity(2048));
        for index in 0..1024_u64 {
            cache.put(index, index).unwrap();
        }

        b.iter(|| {
            black_box(cache.clear_expired().unwrap());
        })
    });
}

criterion_group!(benches, read_benchmarks, write_benchmarks, sweep_benchmarks);
criterion_main!(benches);
