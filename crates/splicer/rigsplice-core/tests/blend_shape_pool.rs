mod common;

use std::collections::BTreeSet;

use common::{approx3, sources};
use rigsplice_core::{
    BlendShapePool, BlendShapeSplicer, DnaReader, MemoryResource, Narrow128, SpliceError,
    SpliceWeights, SplicerConfig, VertexWeights, Wide256,
};

#[test]
fn union_equals_sorted_union_of_sources() {
    let arena = MemoryResource::new();
    let (a, b) = sources();
    let pool = BlendShapePool::new(&a, &[&a, &b], &arena).unwrap();
    assert_eq!(pool.mesh_count(), 1);
    assert_eq!(pool.blend_shape_count(0), 2);
    for target in 0..2u16 {
        let expected: BTreeSet<u32> = [&a, &b]
            .iter()
            .flat_map(|s| s.blend_shape_target_vertex_indices(0, target).iter().copied())
            .collect();
        let expected: Vec<u32> = expected.into_iter().collect();
        assert_eq!(pool.vertex_indices(0, target), &expected[..]);
    }
    assert_eq!(pool.vertex_indices(0, 0), &[1, 4, 9, 17]);
    assert_eq!(pool.vertex_indices(0, 1), &[0]);
}

#[test]
fn out_of_range_queries_are_empty() {
    let arena = MemoryResource::new();
    let (a, b) = sources();
    let pool = BlendShapePool::new(&a, &[&a, &b], &arena).unwrap();
    assert_eq!(pool.blend_shape_count(1), 0);
    assert!(pool.vertex_indices(0, 2).is_empty());
    assert!(pool.vertex_indices(5, 0).is_empty());
    assert!(pool.deltas().get(0, 2).is_none());
}

#[test]
fn deltas_follow_union_order() {
    let arena = MemoryResource::new();
    let (a, b) = sources();
    let pool = BlendShapePool::new(&a, &[&a, &b], &arena).unwrap();
    let smile = pool.deltas().get(0, 0).unwrap();
    assert_eq!(smile.row_count(), 1);
    assert_eq!(smile.column_count(), 2);
    // union [1, 4, 9, 17]
    assert_eq!(smile[0][0].get(0), [1.0, 0.0, 0.0]);
    assert_eq!(smile[0][0].get(2), [0.0, 0.0, 0.0]);
    assert_eq!(smile[0][1].get(1), [3.0, 3.0, 0.0]);
    assert_eq!(smile[0][1].get(2), [0.0, 2.0, 0.0]);
    assert_eq!(smile[0][0].get(3), [0.0, 0.0, 1.0]);
}

#[test]
fn shrinking_does_not_change_contents() {
    let arena = MemoryResource::new();
    let (a, b) = sources();
    let cfg = SplicerConfig {
        shrink_pools: false,
        ..SplicerConfig::default()
    };
    let loose = BlendShapePool::with_config(&a, &[&a, &b], &cfg, &arena).unwrap();
    let tight = BlendShapePool::new(&a, &[&a, &b], &arena).unwrap();
    for target in 0..2 {
        assert_eq!(loose.vertex_indices(0, target), tight.vertex_indices(0, target));
    }
}

#[test]
fn splices_pooled_deltas_with_vertex_weights() {
    let arena = MemoryResource::new();
    let (a, b) = sources();
    let pool = BlendShapePool::new(&a, &[&a, &b], &arena).unwrap();
    let mut sw = SpliceWeights::new(2, 2, &arena);
    sw.set(0, &[0.2, 0.3, 0.2, 0.3]).unwrap();
    let mut vw = VertexWeights::new(&a, &arena).unwrap();

    let narrow = Narrow128;
    let splicer = BlendShapeSplicer::new(&narrow);
    let scratch = MemoryResource::new();
    // it should refuse to splice before weights exist
    let err = splicer.splice(&pool, &vw, &[0, 1], 0, &scratch).unwrap_err();
    assert_eq!(err, SpliceError::WeightsNotComputed { domain: "mesh", index: 0 });

    vw.compute(&sw, &[0, 1], &[0]).unwrap();
    let spliced = splicer.splice(&pool, &vw, &[0, 1], 0, &scratch).unwrap();
    assert_eq!(spliced.len(), 2);
    assert_eq!(spliced[0].vertex_indices, vec![1, 4, 9, 17]);
    let expected = [[0.2, 0.0, 0.0], [0.8, 0.8, 0.0], [0.0, 0.4, 0.0], [0.0, 0.0, 0.3]];
    for (got, want) in spliced[0].deltas.iter().zip(expected) {
        approx3(*got, want, 1e-6);
    }
    approx3(spliced[1].deltas[0], [0.0, -0.2, 0.0], 1e-6);

    let wide = Wide256;
    let again = BlendShapeSplicer::new(&wide)
        .splice(&pool, &vw, &[1], 0, &scratch)
        .unwrap();
    approx3(again[0].deltas[0], [0.0, 0.0, 0.0], 1e-6);
    approx3(again[0].deltas[1], [0.6, 0.6, 0.0], 1e-6);
    assert!(again[1].deltas.iter().all(|d| *d == [0.0; 3]));
}

#[test]
fn splice_rejects_unknown_mesh() {
    let arena = MemoryResource::new();
    let (a, b) = sources();
    let pool = BlendShapePool::new(&a, &[&a, &b], &arena).unwrap();
    let vw = VertexWeights::new(&a, &arena).unwrap();
    let narrow = Narrow128;
    let err = BlendShapeSplicer::new(&narrow)
        .splice(&pool, &vw, &[0], 3, &arena)
        .unwrap_err();
    assert_eq!(err, SpliceError::MeshOutOfRange { index: 3, mesh_count: 1 });
}
