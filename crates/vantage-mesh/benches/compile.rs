use criterion::{Criterion, criterion_group, criterion_main};
use std::sync::Arc;
use vantage_level::{Block, BlockPalette, Level, SectionCoord, TerrainParams};
use vantage_mesh::{compile_section, compute_visibility};
use vantage_section::generate_section_buf;

fn bench_compile(c: &mut Criterion) {
    let palette = Arc::new(BlockPalette::default());
    let level = Level::new(palette.clone(), TerrainParams::default());
    // Surface section: mixed air/solid, the worst case for flood fill.
    let buf = generate_section_buf(&level, SectionCoord::new(0, 1, 0));

    c.bench_function("compute_visibility/surface", |b| {
        b.iter(|| compute_visibility(&buf, &palette))
    });

    c.bench_function("compile_section/surface", |b| {
        b.iter(|| {
            compile_section(&buf, &palette, |wx, wy, wz| level.block_at(wx, wy, wz))
        })
    });

    let empty = generate_section_buf(&level, SectionCoord::new(0, 40, 0));
    c.bench_function("compile_section/empty", |b| {
        b.iter(|| compile_section(&empty, &palette, |_, _, _| Block::AIR))
    });
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
