mod common;

use common::{approx, dna, sources};
use rigsplice_core::{
    JointWeights, MemoryResource, RegionAffiliation, SpliceError, SpliceWeights, SplicerConfig,
    VertexWeights, BLOCK_SIZE,
};

fn uniform_weights(arena: &MemoryResource) -> SpliceWeights<'_> {
    let mut sw = SpliceWeights::new(2, 2, arena);
    sw.set(0, &[0.2, 0.3, 0.2, 0.3]).unwrap();
    sw
}

#[test]
fn affiliation_total_is_weighted_sum() {
    let aff = RegionAffiliation::<4>::new(&[0, 1], &[0.3, 0.7], 2).unwrap();
    approx(aff.total_weight_across_regions(&[0.2, 0.3]), 0.27, 1e-6);
    let empty = RegionAffiliation::<4>::default();
    assert_eq!(empty.total_weight_across_regions(&[0.2, 0.3]), 0.0);
}

#[test]
fn joint_weights_resolve_reference_scenario() {
    let arena = MemoryResource::new();
    let (a, _) = sources();
    let sw = uniform_weights(&arena);
    let mut jw = JointWeights::new(&a, &arena).unwrap();
    // it should report empty until computed
    assert!(jw.is_empty());

    jw.compute(&sw, &[0, 1]).unwrap();
    assert!(!jw.is_empty());
    assert_eq!(jw.data().row_count(), 1);
    assert_eq!(jw.data().column_count(), 2);
    for source in 0..2 {
        approx(jw.weight(0, source).unwrap(), 0.27, 1e-6);
        assert_eq!(jw.weight(1, source), Some(0.0));
        approx(jw.weight(2, source).unwrap(), 0.2, 1e-6);
    }
    // it should leave padding lanes at zero
    assert_eq!(jw.data()[0][0][3], 0.0);

    jw.clear();
    assert!(jw.is_empty());
    assert_eq!(jw.weight(0, 0), None);
}

#[test]
fn unselected_sources_stay_zero() {
    let arena = MemoryResource::new();
    let (a, _) = sources();
    let sw = uniform_weights(&arena);
    let mut jw = JointWeights::new(&a, &arena).unwrap();
    jw.compute(&sw, &[1]).unwrap();
    assert_eq!(jw.weight(0, 0), Some(0.0));
    approx(jw.weight(0, 1).unwrap(), 0.27, 1e-6);

    let mut all = JointWeights::new(&a, &arena).unwrap();
    all.compute(&sw, &[0, 1]).unwrap();
    assert_eq!(all.weight(0, 1), jw.weight(0, 1));
}

#[test]
fn vertex_weights_cover_every_block() {
    let arena = MemoryResource::new();
    let (a, _) = sources();
    let sw = uniform_weights(&arena);
    let mut vw = VertexWeights::new(&a, &arena).unwrap();
    assert!(vw.is_empty());
    vw.compute(&sw, &[0, 1], &[0]).unwrap();
    assert!(!vw.is_empty());

    let tiled = vw.data(0).unwrap();
    assert_eq!(tiled.row_count(), 2);
    assert_eq!(tiled.column_count(), 2);
    let affiliations = dna("source-a").meshes[0].vertex_affiliations.clone();
    for vertex in 0..20 {
        let aff = &affiliations[vertex];
        let expected: f32 = aff
            .regions
            .iter()
            .zip(&aff.values)
            .map(|(&r, &v)| v * [0.2, 0.3][usize::from(r)])
            .sum();
        for source in 0..2 {
            approx(vw.weight(0, vertex, source).unwrap(), expected, 1e-6);
            let lane = tiled[vertex / BLOCK_SIZE][source][vertex % BLOCK_SIZE];
            assert_eq!(Some(lane), vw.weight(0, vertex, source));
        }
    }
    approx(vw.weight(0, 19, 0).unwrap(), 0.25, 1e-6);
    assert_eq!(vw.weight(0, 20, 0), None);

    vw.clear();
    assert!(vw.is_empty());
}

#[test]
fn compute_checks_indices() {
    let arena = MemoryResource::new();
    let (a, _) = sources();
    let sw = uniform_weights(&arena);
    let mut vw = VertexWeights::new(&a, &arena).unwrap();
    assert_eq!(
        vw.compute(&sw, &[0], &[1]).unwrap_err(),
        SpliceError::MeshOutOfRange { index: 1, mesh_count: 1 }
    );
    let mut jw = JointWeights::new(&a, &arena).unwrap();
    assert_eq!(
        jw.compute(&sw, &[2]).unwrap_err(),
        SpliceError::SourceOutOfRange { index: 2, source_count: 2 }
    );
    // it should clear previous results even when the new request fails
    jw.compute(&sw, &[0]).unwrap();
    assert!(jw.compute(&sw, &[5]).is_err());
    assert!(jw.is_empty());
}

#[test]
fn empty_source_selection_yields_zero_weights() {
    let arena = MemoryResource::new();
    let (a, _) = sources();
    let sw = uniform_weights(&arena);
    let mut jw = JointWeights::new(&a, &arena).unwrap();
    jw.compute(&sw, &[]).unwrap();
    assert_eq!(jw.data().row_count(), 1);
    assert!(jw.data().as_slice().iter().all(|b| b.lanes().iter().all(|w| *w == 0.0)));
}

#[test]
fn invalid_regions_fail_unless_lenient() {
    let arena = MemoryResource::new();
    let bad = dna("bad-regions");
    let err = VertexWeights::new(&bad, &arena).unwrap_err();
    assert_eq!(err, SpliceError::RegionOutOfRange { region: 2, region_count: 2 });

    let cfg = SplicerConfig::from_json(&rigsplice_test_fixtures::configs::json("lenient").unwrap()).unwrap();
    let mut vw = VertexWeights::with_config(&bad, &cfg, &arena).unwrap();
    let sw = uniform_weights(&arena);
    vw.compute_all(&sw, &[0, 1]).unwrap();
    // region 2 is dropped, leaving 0.5 * 0.2
    approx(vw.weight(0, 3, 0).unwrap(), 0.1, 1e-6);
}

#[test]
fn too_few_region_columns_is_an_error() {
    let arena = MemoryResource::new();
    let (a, _) = sources();
    let narrow = SpliceWeights::new(1, 1, &arena);

    let mut jw = JointWeights::new(&a, &arena).unwrap();
    assert_eq!(jw.region_count(), 2);
    let err = jw.compute(&narrow, &[0]).unwrap_err();
    assert_eq!(
        err,
        SpliceError::ShapeMismatch {
            what: "splice weight region count",
            expected: 2,
            actual: 1
        }
    );
    assert!(jw.is_empty());

    let mut vw = VertexWeights::new(&a, &arena).unwrap();
    let err = vw.compute(&narrow, &[0], &[0]).unwrap_err();
    assert!(matches!(err, SpliceError::ShapeMismatch { what: "splice weight region count", .. }));
    assert!(vw.is_empty());
}
