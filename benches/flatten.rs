use criterion::{criterion_group, criterion_main, Criterion, black_box};

use seat_watch::specs::area_tree::{flatten, AreaId, AreaNode};

/// Library-sized tree: floors → rooms → desks, counts on rooms and desks.
fn sample_tree() -> AreaNode {
    let mut next = 0i64;
    let mut id = || { next += 1; AreaId::Num(next) };

    let floors = (0..6)
        .map(|f| AreaNode {
            id: id(),
            name: format!("Floor {f}"),
            total_count: None,
            unavailable_count: None,
            children: (0..8)
                .map(|r| AreaNode {
                    id: id(),
                    name: format!("Room {f}.{r}"),
                    total_count: Some(120),
                    unavailable_count: Some(40 + r),
                    children: (0..20)
                        .map(|d| AreaNode {
                            id: id(),
                            name: format!("Desk {f}.{r}.{d}"),
                            total_count: Some(6),
                            unavailable_count: Some(d % 7),
                            children: Vec::new(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    AreaNode { id: id(), name: "Library".into(), total_count: None, unavailable_count: None, children: floors }
}

fn bench_flatten(c: &mut Criterion) {
    let tree = sample_tree();
    let json = std::fs::read_to_string(".ignore/samples/v3areas.json").ok();

    c.bench_function("flatten_synthetic", |b| {
        b.iter(|| {
            let snap = flatten(std::slice::from_ref(black_box(&tree)), 600);
            black_box(snap.len())
        })
    });

    // Captured payload, when one is lying around.
    if let Some(body) = json {
        c.bench_function("parse_and_flatten_captured", |b| {
            b.iter(|| {
                let snap = seat_watch::fetch::snapshot_from_body(black_box(&body), 600);
                black_box(snap.map(|s| s.len()).unwrap_or(0))
            })
        });
    }
}

criterion_group!(benches, bench_flatten);
criterion_main!(benches);
