// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use criterion::{criterion_group, criterion_main, Criterion};
use kv_primitives::{Entry, SkipList};
use std::collections::BTreeMap;
use std::hint::black_box;
use std::sync::RwLock;

fn keys(n: usize) -> Vec<Vec<u8>> {
    // Shared 8-byte prefix so most comparisons hit the tie-break path.
    (0..n)
        .map(|i| format!("user:000{:08}", (i * 7919) % n).into_bytes())
        .collect()
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("SkipList Add");
    for n in [1_000, 10_000].iter() {
        let keys = keys(*n);

        group.bench_function(format!("SkipList (N={})", n), |bencher| {
            bencher.iter(|| {
                let list = SkipList::with_seed(1);
                for k in &keys {
                    list.add(Entry::new(k.clone(), "v")).unwrap();
                }
                black_box(list.len())
            })
        });

        group.bench_function(format!("RwLock<BTreeMap> (N={})", n), |bencher| {
            bencher.iter(|| {
                let map = RwLock::new(BTreeMap::new());
                for k in &keys {
                    map.write().unwrap().insert(k.clone(), b"v".to_vec());
                }
                black_box(map.read().unwrap().len())
            })
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("SkipList Search");
    for n in [1_000, 10_000].iter() {
        let keys = keys(*n);
        let list = SkipList::with_seed(1);
        for k in &keys {
            list.add(Entry::new(k.clone(), "v")).unwrap();
        }

        group.bench_function(format!("Hit (N={})", n), |bencher| {
            bencher.iter(|| {
                for k in &keys {
                    black_box(list.search(black_box(k)));
                }
            })
        });

        group.bench_function(format!("Full Scan (N={})", n), |bencher| {
            bencher.iter(|| black_box(list.iter().count()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add, bench_search);
criterion_main!(benches);
