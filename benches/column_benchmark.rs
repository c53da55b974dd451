use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rehal::data::{Alignment, BottomSegment, GenomeIdx, TopSegment};
use rehal::query::{ColumnIteratorBuilder, PositionCache};
use std::hint::black_box;

/// Balanced binary tree of genomes, fully aligned one-to-one
fn build_tree(depth: usize, n_segments: u64, seg_length: u64) -> Alignment {
    let mut aln = Alignment::new();
    let root = aln.add_root_genome("g0").unwrap();
    let mut frontier = vec![root];
    let mut next_name = 1usize;
    for _ in 1..depth {
        let mut next = Vec::new();
        for parent in frontier {
            for _ in 0..2 {
                let child = aln
                    .add_leaf_genome(format!("g{next_name}"), parent)
                    .unwrap();
                next_name += 1;
                next.push(child);
            }
        }
        frontier = next;
    }

    let length = n_segments * seg_length;
    let indices: Vec<GenomeIdx> = aln.genomes().map(|(idx, _)| idx).collect();
    for idx in indices {
        let n_children = aln.genome(idx).children().len();
        let g = aln.genome_mut(idx);
        g.add_sequence("seq", length);
        g.set_dna(vec![b'A'; length as usize]).unwrap();
        for i in 0..n_segments {
            if n_children > 0 {
                let mut seg = BottomSegment::new((i * seg_length) as i64, seg_length, n_children);
                for slot in 0..n_children {
                    seg.set_child_link(slot, Some(i as u32), false);
                }
                g.push_bottom(seg);
            }
        }
        if aln.genome(idx).parent().is_some() {
            let g = aln.genome_mut(idx);
            for i in 0..n_segments {
                g.push_top(TopSegment::with_parent(
                    i as u32,
                    (i * seg_length) as i64,
                    seg_length,
                    i as u32,
                    false,
                ));
            }
        }
    }
    aln
}

fn bench_column_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("column_walk");

    for depth in [2usize, 3, 4] {
        let aln = build_tree(depth, 100, 100);
        let root = aln.root().unwrap();
        let n_genomes = aln.n_genomes() as u64;
        group.throughput(Throughput::Elements(n_genomes));

        group.bench_with_input(BenchmarkId::new("tree_depth", depth), &aln, |b, aln| {
            b.iter(|| {
                let mut iter = ColumnIteratorBuilder::genome(root)
                    .range(0, 999)
                    .build(black_box(aln))
                    .unwrap();
                let mut total = 0usize;
                while !iter.at_end() {
                    total += iter.column().len();
                    iter.to_right().unwrap();
                }
                black_box(total)
            })
        });
    }

    group.finish();
}

fn bench_position_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("position_cache");

    for stride in [1i64, 7, 1000] {
        group.throughput(Throughput::Elements(100_000));
        group.bench_with_input(BenchmarkId::new("stride", stride), &stride, |b, &stride| {
            b.iter(|| {
                let mut cache = PositionCache::new();
                for i in 0..100_000i64 {
                    cache.insert(black_box(i * stride));
                }
                black_box(cache.len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_column_walk, bench_position_cache);
criterion_main!(benches);
