use criterion::{Criterion, criterion_group, criterion_main};
use mutation_cell::{
    AnyCell, BytesModification, IntegerModification, ModifiableBytes, ModifiableI32,
    ModifiableString, MutationCell, RandomLimits, StringModification, choose_cell, find_cells,
    holder, resolve_cell_mut,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

// ─── Test Data ──────────────────────────────────────────────────────────────

struct Extension {
    kind: ModifiableI32,
    payload: ModifiableBytes,
}

struct Hello {
    version: ModifiableI32,
    server_name: ModifiableString,
    random: ModifiableBytes,
    extensions: Vec<Extension>,
}

holder!(Extension { cells: [kind, payload], nested: [] });
holder!(Hello {
    cells: [version, server_name, random],
    nested: [extensions],
});

/// A handshake-like message with `n` extensions (3 + 2n cells).
fn make_hello(n: usize) -> Hello {
    Hello {
        version: MutationCell::new(0x0303),
        server_name: MutationCell::new("example.com".to_string()),
        random: MutationCell::new(vec![0x5a; 32]),
        extensions: (0..n)
            .map(|i| Extension {
                kind: MutationCell::new(i as i32),
                payload: MutationCell::new(vec![i as u8; 64]),
            })
            .collect(),
    }
}

/// A 1 KiB payload with a chain of `len` mixed modifications.
fn make_chain(len: usize) -> ModifiableBytes {
    let mut cell = MutationCell::new(vec![0xab; 1024]);
    for i in 0..len {
        let m = match i % 4 {
            0 => BytesModification::xor(vec![0xff; 4], (i * 7) as i64),
            1 => BytesModification::insert(vec![0x00; 2], i as i64),
            2 => BytesModification::delete(i as i64, 3),
            _ => BytesModification::shuffle(vec![1, 2, 3, 4]),
        };
        cell.append_modification(m);
    }
    cell
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 1: Chain evaluation
// ═══════════════════════════════════════════════════════════════════════════

fn bench_chain_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_evaluation");

    let empty = make_chain(0);
    group.bench_function("bytes (no modifications)", |b| {
        b.iter(|| black_box(&empty).value().unwrap())
    });

    for len in [1usize, 8, 64] {
        let cell = make_chain(len);
        group.bench_function(format!("bytes ({len} modifications)"), |b| {
            b.iter(|| black_box(&cell).value().unwrap())
        });
    }

    let int = ModifiableI32::new(7)
        .with_modification(IntegerModification::add(3))
        .with_modification(IntegerModification::insert(0b101, 4))
        .with_modification(IntegerModification::swap_endian());
    group.bench_function("i32 (3 modifications)", |b| {
        b.iter(|| black_box(&int).value().unwrap())
    });

    let text = ModifiableString::new("GET /index.html HTTP/1.1".to_string())
        .with_modification(StringModification::insert("%00", 5))
        .with_modification(StringModification::delete(-9, 4));
    group.bench_function("string (2 modifications)", |b| {
        b.iter(|| black_box(&text).value().unwrap())
    });

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 2: Random modifications
// ═══════════════════════════════════════════════════════════════════════════

fn bench_random_modification(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_modification");
    let limits = RandomLimits::default();

    let bytes = ModifiableBytes::new(vec![0x11; 256]);
    group.bench_function("bytes (256 B original)", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| bytes.random_modification_with(&limits, &mut rng))
    });

    let int = ModifiableI32::new(1234);
    group.bench_function("i32", |b| {
        let mut rng = StdRng::seed_from_u64(2);
        b.iter(|| int.random_modification_with(&limits, &mut rng))
    });

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 3: Graph walk
// ═══════════════════════════════════════════════════════════════════════════

fn bench_graph_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_walk");

    for n in [4usize, 64] {
        let hello = make_hello(n);
        group.bench_function(format!("find_cells ({n} extensions)"), |b| {
            b.iter(|| find_cells(black_box(&hello)).len())
        });
    }

    let hello = make_hello(16);
    group.bench_function("choose_cell (16 extensions)", |b| {
        let mut rng = StdRng::seed_from_u64(3);
        b.iter(|| choose_cell(black_box(&hello), &mut rng).map(|r| r.field))
    });

    // ── pick + resolve + mutate, the per-iteration cost of a fuzz step ──

    group.bench_function("choose + resolve + append", |b| {
        let mut hello = make_hello(16);
        let mut rng = StdRng::seed_from_u64(4);
        let limits = RandomLimits::default();
        b.iter(|| {
            let path = choose_cell(&hello, &mut rng).map(|r| r.path).unwrap();
            let cell = resolve_cell_mut(&mut hello, &path).unwrap();
            cell.clear_modifications();
            cell.append_random_modification(&limits, &mut rng);
        })
    });

    group.finish();
}

// ─── Criterion Main ─────────────────────────────────────────────────────────

criterion_group!(
    benches,
    bench_chain_evaluation,
    bench_random_modification,
    bench_graph_walk,
);
criterion_main!(benches);
