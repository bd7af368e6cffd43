//! Performance benchmarks for path handling.
//!
//! These benchmarks measure the hot paths of every browse request:
//! - Sandbox resolution of client subpaths
//! - Folder listing and sorting
//! - Zip archive creation

use std::fs;
use std::io::Cursor;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lanshare::files::{archive, sandbox, DirectoryBrowser, ShareRegistry};
use tempfile::TempDir;

/// A share with `width` files per level, `depth` levels deep.
fn build_tree(width: usize, depth: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let mut dir = temp_dir.path().to_path_buf();
    for level in 0..depth {
        for i in 0..width {
            fs::write(dir.join(format!("file_{:04}.txt", i)), b"benchmark").unwrap();
        }
        dir = dir.join(format!("level_{}", level));
        fs::create_dir(&dir).unwrap();
    }
    temp_dir
}

/// Benchmark sandbox resolution of accepted and rejected subpaths.
fn bench_sandbox_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("sandbox_resolve");
    let tree = build_tree(4, 6);
    let root = tree.path();

    let cases = [
        ("root", ""),
        ("shallow", "level_0"),
        ("deep", "level_0/level_1/level_2/level_3/level_4"),
        ("missing_tail", "level_0/level_1/nope/also_nope.txt"),
        ("dot_segments", "level_0/./level_1/../level_1/file_0001.txt"),
        ("traversal", "level_0/../../../etc/passwd"),
    ];

    for (name, subpath) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), subpath, |b, subpath| {
            b.iter(|| sandbox::resolve(black_box(root), black_box(subpath)))
        });
    }

    group.finish();
}

/// Benchmark folder listing for directories of increasing size.
fn bench_folder_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("folder_listing");

    for width in [10, 100, 1000] {
        let tree = build_tree(width, 1);
        let registry = Arc::new(ShareRegistry::new());
        let id = registry.add(tree.path()).unwrap().id;
        let browser = DirectoryBrowser::new(Arc::clone(&registry));

        group.bench_with_input(BenchmarkId::from_parameter(width), &id, |b, id| {
            b.iter(|| browser.list(black_box(id), "").unwrap())
        });
    }

    group.finish();
}

/// Benchmark building a zip of a small tree, seekable and streamed.
fn bench_zip_archive(c: &mut Criterion) {
    let tree = build_tree(20, 3);

    c.bench_function("zip_archive_60_files", |b| {
        b.iter(|| archive::write_zip(tree.path(), "bench", true, Cursor::new(Vec::new())).unwrap())
    });

    c.bench_function("zip_stream_60_files", |b| {
        b.iter(|| archive::stream_zip(tree.path(), "bench", true, std::io::sink()).unwrap())
    });
}

criterion_group!(
    benches,
    bench_sandbox_resolve,
    bench_folder_listing,
    bench_zip_archive,
);

criterion_main!(benches);
