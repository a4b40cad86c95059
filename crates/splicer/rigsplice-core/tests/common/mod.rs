#![allow(dead_code)]

use rigsplice_core::RawDna;

pub fn dna(name: &str) -> RawDna {
    rigsplice_test_fixtures::dnas::load(name).expect("load dna fixture")
}

/// Archetype first, then the second source.
pub fn sources() -> (RawDna, RawDna) {
    (dna("source-a"), dna("source-b"))
}

pub fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

pub fn approx3(a: [f32; 3], b: [f32; 3], eps: f32) {
    for i in 0..3 {
        assert!((a[i] - b[i]).abs() <= eps, "left={a:?} right={b:?} eps={eps}");
    }
}
