use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use sweep::{CollisionChannels, CollisionWorld, QueryFilter, Shape, StaticWorld};

/// A grid of crates plus a row of character capsules.
fn arena() -> StaticWorld {
    let mut world = StaticWorld::new();
    for i in 0..16 {
        for j in 0..16 {
            let min = Vec3::new(i as f32 * 300.0, j as f32 * 300.0, 0.0);
            world.insert(
                Shape::box_min_max(min, min + Vec3::new(100.0, 100.0, 120.0)),
                CollisionChannels::WORLD_STATIC | CollisionChannels::VAULTABLE,
                None,
            );
        }
    }
    for k in 0..32 {
        let center = Vec3::new(k as f32 * 150.0 + 200.0, 200.0, 96.0);
        world.insert(Shape::upright_capsule(center, 42.0, 96.0), CollisionChannels::PAWN, Some(k));
    }
    world
}

fn bench_forward_raycast(c: &mut Criterion) {
    let world = arena();
    let filter = QueryFilter::new(CollisionChannels::WORLD_STATIC);

    c.bench_function("forward_raycast", |b| {
        b.iter(|| {
            black_box(world.raycast(
                black_box(Vec3::new(-50.0, 50.0, 60.0)),
                Vec3::X,
                200.0,
                &filter,
            ))
        })
    });
}

fn bench_melee_sweep_all(c: &mut Criterion) {
    let world = arena();
    let filter = QueryFilter::new(CollisionChannels::PAWN).ignoring_owner(0);

    c.bench_function("melee_sweep_all", |b| {
        b.iter(|| {
            black_box(world.sphere_cast_all(
                black_box(Vec3::new(150.0, 200.0, 96.0)),
                Vec3::X,
                100.0,
                50.0,
                &filter,
            ))
        })
    });
}

fn bench_capsule_overlap(c: &mut Criterion) {
    let world = arena();
    let filter = QueryFilter::new(CollisionChannels::WORLD_STATIC);
    let capsule = Shape::upright_capsule(Vec3::new(350.0, 350.0, 250.0), 42.0, 96.0);

    c.bench_function("capsule_overlap", |b| {
        b.iter(|| black_box(world.overlaps_any(black_box(&capsule), &filter)))
    });
}

criterion_group!(benches, bench_forward_raycast, bench_melee_sweep_all, bench_capsule_overlap);
criterion_main!(benches);
