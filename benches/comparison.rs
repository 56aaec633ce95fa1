// Copyright © The Sprig Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Criterion benchmarks comparing the sprig trees against other maps.
//!
//! This benchmark suite compares:
//! - `sprig::Node` - Unbalanced BST with one mutex per node
//! - `sprig::Tree` - Unbalanced BST behind one RwLock, with subtree metadata
//! - `crossbeam_skiplist::SkipMap` - Lock-free concurrent skip list
//! - `std::collections::BTreeMap` - Standard library B-tree behind `parking_lot::RwLock`
//!
//! Only random keys are used: sorted input degrades both sprig trees into a
//! linked list and measures nothing interesting.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use crossbeam_skiplist::SkipMap;
use parking_lot::RwLock;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sprig::{Node, Tree};
use std::collections::BTreeMap;
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const SEED: u64 = 42;

// ============================================================================
// Helper Functions
// ============================================================================

/// Generate random keys using a seeded RNG
fn random_keys(count: usize, seed: u64) -> Vec<u64> {
	let mut rng = StdRng::seed_from_u64(seed);
	(0..count).map(|_| rng.random()).collect()
}

fn build_node(keys: &[u64]) -> Node<u64> {
	let root = Node::with_key(keys[0]);
	for &k in &keys[1..] {
		root.put(k, k);
	}
	root
}

fn build_btreemap(keys: &[u64]) -> RwLock<BTreeMap<u64, u64>> {
	RwLock::new(keys.iter().map(|&k| (k, k)).collect())
}

fn build_skipmap(keys: &[u64]) -> SkipMap<u64, u64> {
	let map = SkipMap::new();
	for &k in keys {
		map.insert(k, k);
	}
	map
}

// ============================================================================
// Single-Threaded Benchmarks
// ============================================================================

fn bench_insert_random(c: &mut Criterion) {
	let mut group = c.benchmark_group("insert_random");

	for count in [1_000, 10_000, 100_000] {
		let keys = random_keys(count, SEED);
		group.throughput(Throughput::Elements(count as u64));

		group.bench_with_input(BenchmarkId::new("sprig_node", count), &keys, |b, keys| {
			b.iter_batched(
				|| Node::with_key(keys[0]),
				|root| {
					for &k in &keys[1..] {
						root.put(k, k);
					}
					root
				},
				BatchSize::SmallInput,
			)
		});

		group.bench_with_input(BenchmarkId::new("sprig_tree", count), &keys, |b, keys| {
			b.iter_batched(
				Tree::new,
				|tree| {
					for &k in keys {
						tree.put(k, k);
					}
					tree
				},
				BatchSize::SmallInput,
			)
		});

		group.bench_with_input(BenchmarkId::new("skipmap", count), &keys, |b, keys| {
			b.iter_batched(
				SkipMap::new,
				|map| {
					for &k in keys {
						black_box(map.insert(k, k));
					}
					map
				},
				BatchSize::SmallInput,
			)
		});

		group.bench_with_input(BenchmarkId::new("btreemap_rwlock", count), &keys, |b, keys| {
			b.iter_batched(
				|| RwLock::new(BTreeMap::new()),
				|map| {
					for &k in keys {
						black_box(map.write().insert(k, k));
					}
					map
				},
				BatchSize::SmallInput,
			)
		});
	}

	group.finish();
}

fn bench_lookup(c: &mut Criterion) {
	for (name, probe_seed) in [("lookup_hit", SEED), ("lookup_miss", SEED + 1)] {
		let mut group = c.benchmark_group(name);

		for count in [1_000, 10_000, 100_000] {
			let keys = random_keys(count, SEED);
			// A different seed yields keys that are absent with overwhelming probability.
			let probes = random_keys(count, probe_seed);
			group.throughput(Throughput::Elements(count as u64));

			let root = build_node(&keys);
			let tree: Tree<u64> = Tree::with_keys(&keys);
			let skipmap = build_skipmap(&keys);
			let btreemap = build_btreemap(&keys);

			group.bench_with_input(BenchmarkId::new("sprig_node", count), &probes, |b, probes| {
				b.iter(|| {
					for &k in probes {
						black_box(root.get(k).map(Node::value));
					}
				})
			});

			group.bench_with_input(BenchmarkId::new("sprig_tree", count), &probes, |b, probes| {
				b.iter(|| {
					for &k in probes {
						black_box(tree.lookup(k, |e| *e.value()));
					}
				})
			});

			group.bench_with_input(BenchmarkId::new("skipmap", count), &probes, |b, probes| {
				b.iter(|| {
					for &k in probes {
						black_box(skipmap.get(&k).map(|e| *e.value()));
					}
				})
			});

			group.bench_with_input(
				BenchmarkId::new("btreemap_rwlock", count),
				&probes,
				|b, probes| {
					b.iter(|| {
						for &k in probes {
							black_box(btreemap.read().get(&k).copied());
						}
					})
				},
			);
		}

		group.finish();
	}
}

fn bench_traversal(c: &mut Criterion) {
	let mut group = c.benchmark_group("full_traversal");

	for count in [10_000, 100_000] {
		let keys = random_keys(count, SEED);
		group.throughput(Throughput::Elements(count as u64));

		let root = build_node(&keys);
		let tree: Tree<u64> = Tree::with_keys(&keys);
		let skipmap = build_skipmap(&keys);
		let btreemap = build_btreemap(&keys);

		// Forks one thread per root child.
		group.bench_function(BenchmarkId::new("sprig_node_search", count), |b| {
			b.iter(|| {
				let visited = AtomicUsize::new(0);
				root.search_func(|visit| {
					black_box(*visit.value());
					visited.fetch_add(1, Ordering::Relaxed);
					true
				});
				visited.into_inner()
			})
		});

		group.bench_function(BenchmarkId::new("sprig_node_deepest", count), |b| {
			b.iter(|| black_box(root.deepest_node().key()))
		});

		group.bench_function(BenchmarkId::new("sprig_tree_for_each", count), |b| {
			b.iter(|| {
				let mut visited = 0usize;
				tree.for_each(|entry| {
					black_box(*entry.value());
					visited += 1;
					true
				});
				visited
			})
		});

		group.bench_function(BenchmarkId::new("skipmap", count), |b| {
			b.iter(|| skipmap.iter().map(|e| black_box(*e.value())).count())
		});

		group.bench_function(BenchmarkId::new("btreemap_rwlock", count), |b| {
			b.iter(|| btreemap.read().values().map(|v| black_box(*v)).count())
		});
	}

	group.finish();
}

// ============================================================================
// Concurrent Benchmarks
// ============================================================================

fn bench_concurrent_readers(c: &mut Criterion) {
	let mut group = c.benchmark_group("concurrent_readers");

	let cpu_cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(8);
	let thread_counts = [1, 4, cpu_cores];
	let count = 100_000;
	let lookup_count = 1000;

	let keys = random_keys(count, SEED);
	let lookup_keys: Arc<Vec<u64>> = Arc::new(keys[..lookup_count].to_vec());

	let root = Arc::new(build_node(&keys));
	let tree: Arc<Tree<u64>> = Arc::new(Tree::with_keys(&keys));
	let skipmap = Arc::new(build_skipmap(&keys));
	let btreemap = Arc::new(build_btreemap(&keys));

	for &num_threads in &thread_counts {
		group.throughput(Throughput::Elements((lookup_count * num_threads) as u64));

		group.bench_function(BenchmarkId::new("sprig_node", num_threads), |b| {
			b.iter(|| {
				let handles: Vec<_> = (0..num_threads)
					.map(|_| {
						let root = Arc::clone(&root);
						let keys = Arc::clone(&lookup_keys);
						thread::spawn(move || {
							for &k in keys.iter() {
								black_box(root.get(k).map(Node::value));
							}
						})
					})
					.collect();
				for h in handles {
					h.join().unwrap();
				}
			})
		});

		group.bench_function(BenchmarkId::new("sprig_tree", num_threads), |b| {
			b.iter(|| {
				let handles: Vec<_> = (0..num_threads)
					.map(|_| {
						let tree = Arc::clone(&tree);
						let keys = Arc::clone(&lookup_keys);
						thread::spawn(move || {
							for &k in keys.iter() {
								black_box(tree.lookup(k, |e| *e.value()));
							}
						})
					})
					.collect();
				for h in handles {
					h.join().unwrap();
				}
			})
		});

		group.bench_function(BenchmarkId::new("skipmap", num_threads), |b| {
			b.iter(|| {
				let handles: Vec<_> = (0..num_threads)
					.map(|_| {
						let map = Arc::clone(&skipmap);
						let keys = Arc::clone(&lookup_keys);
						thread::spawn(move || {
							for &k in keys.iter() {
								black_box(map.get(&k).map(|e| *e.value()));
							}
						})
					})
					.collect();
				for h in handles {
					h.join().unwrap();
				}
			})
		});

		group.bench_function(BenchmarkId::new("btreemap_rwlock", num_threads), |b| {
			b.iter(|| {
				let handles: Vec<_> = (0..num_threads)
					.map(|_| {
						let map = Arc::clone(&btreemap);
						let keys = Arc::clone(&lookup_keys);
						thread::spawn(move || {
							for &k in keys.iter() {
								black_box(map.read().get(&k).copied());
							}
						})
					})
					.collect();
				for h in handles {
					h.join().unwrap();
				}
			})
		});
	}

	group.finish();
}

fn bench_concurrent_writers(c: &mut Criterion) {
	let mut group = c.benchmark_group("concurrent_writers");

	let cpu_cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(8);
	let per_thread = 2_000;

	for num_threads in [1, 4, cpu_cores] {
		let batches: Arc<Vec<Vec<u64>>> =
			Arc::new((0..num_threads).map(|t| random_keys(per_thread, SEED + t as u64)).collect());
		group.throughput(Throughput::Elements((per_thread * num_threads) as u64));

		// Seed the root with the median key so both halves fill.
		group.bench_function(BenchmarkId::new("sprig_node", num_threads), |b| {
			b.iter(|| {
				let root = Arc::new(Node::<u64>::with_key(u64::MAX / 2));
				let handles: Vec<_> = (0..num_threads)
					.map(|t| {
						let root = Arc::clone(&root);
						let batches = Arc::clone(&batches);
						thread::spawn(move || {
							for &k in &batches[t] {
								root.put(k, k);
							}
						})
					})
					.collect();
				for h in handles {
					h.join().unwrap();
				}
				root
			})
		});

		group.bench_function(BenchmarkId::new("sprig_tree", num_threads), |b| {
			b.iter(|| {
				let tree: Arc<Tree<u64>> = Arc::new(Tree::new());
				let handles: Vec<_> = (0..num_threads)
					.map(|t| {
						let tree = Arc::clone(&tree);
						let batches = Arc::clone(&batches);
						thread::spawn(move || {
							for &k in &batches[t] {
								tree.put(k, k);
							}
						})
					})
					.collect();
				for h in handles {
					h.join().unwrap();
				}
				tree
			})
		});

		group.bench_function(BenchmarkId::new("skipmap", num_threads), |b| {
			b.iter(|| {
				let map: Arc<SkipMap<u64, u64>> = Arc::new(SkipMap::new());
				let handles: Vec<_> = (0..num_threads)
					.map(|t| {
						let map = Arc::clone(&map);
						let batches = Arc::clone(&batches);
						thread::spawn(move || {
							for &k in &batches[t] {
								map.insert(k, k);
							}
						})
					})
					.collect();
				for h in handles {
					h.join().unwrap();
				}
				map
			})
		});

		group.bench_function(BenchmarkId::new("btreemap_rwlock", num_threads), |b| {
			b.iter(|| {
				let map: Arc<RwLock<BTreeMap<u64, u64>>> = Arc::new(RwLock::new(BTreeMap::new()));
				let handles: Vec<_> = (0..num_threads)
					.map(|t| {
						let map = Arc::clone(&map);
						let batches = Arc::clone(&batches);
						thread::spawn(move || {
							for &k in &batches[t] {
								map.write().insert(k, k);
							}
						})
					})
					.collect();
				for h in handles {
					h.join().unwrap();
				}
				map
			})
		});
	}

	group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(single_threaded_benches, bench_insert_random, bench_lookup, bench_traversal,);

criterion_group!(concurrent_benches, bench_concurrent_readers, bench_concurrent_writers,);

criterion_main!(single_threaded_benches, concurrent_benches);
