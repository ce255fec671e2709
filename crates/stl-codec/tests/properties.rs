//! Property-based tests for the STL size law, extraction indices and repair
//! idempotence.

use proptest::prelude::*;

use cad_types::ErrorKind;
use stl_codec::repair::repair_bytes;
use stl_codec::{encode_binary, extract, validate_bytes, weld_exact, StlTriangle};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_coord() -> impl Strategy<Value = f32> {
    -1000.0f32..1000.0
}

fn arb_vertex() -> impl Strategy<Value = [f32; 3]> {
    (arb_coord(), arb_coord(), arb_coord()).prop_map(|(x, y, z)| [x, y, z])
}

fn arb_triangle() -> impl Strategy<Value = StlTriangle> {
    (arb_vertex(), arb_vertex(), arb_vertex())
        .prop_map(|(a, b, c)| StlTriangle::from_vertices([a, b, c]))
}

fn arb_triangles() -> impl Strategy<Value = Vec<StlTriangle>> {
    prop::collection::vec(arb_triangle(), 0..40)
}

// ---------------------------------------------------------------------------
// Binary size law
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn binary_valid_iff_size_matches_count(
        tris in arb_triangles(),
        declared in 0u32..60,
    ) {
        let mut bytes = encode_binary(&tris, "prop");
        bytes[80..84].copy_from_slice(&declared.to_le_bytes());
        let verdict = validate_bytes(&bytes);
        let expected_len = 84 + 50 * declared as usize;
        if expected_len == bytes.len() {
            prop_assert!(verdict.valid, "{}", verdict.message);
        } else {
            prop_assert!(!verdict.valid);
            prop_assert_eq!(verdict.kind, Some(ErrorKind::SizeMismatch));
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction invariants
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn extracted_indices_are_valid_and_flat(tris in arb_triangles()) {
        let out = extract(&encode_binary(&tris, "prop")).unwrap();
        prop_assert!(out.mesh.check_indices().is_ok());
        prop_assert_eq!(out.mesh.vertices.len(), 3 * out.mesh.faces.len());
        prop_assert_eq!(out.surface_types.len(), out.mesh.faces.len());
        for (i, face) in out.mesh.faces.iter().enumerate() {
            let base = 3 * i as u32;
            prop_assert_eq!(face.0, [base, base + 1, base + 2]);
        }
    }
}

// ---------------------------------------------------------------------------
// Repair idempotence
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn repair_preserves_counts_of_welded_mesh(tris in prop::collection::vec(arb_triangle(), 1..40)) {
        // Weld once to get an already-deduplicated mesh, then write it back
        // out and repair again: counts must not change.
        let welded = weld_exact(&tris);
        let facets: Vec<StlTriangle> = welded
            .faces
            .iter()
            .map(|f| StlTriangle::from_vertices(f.0.map(|i| welded.vertices[i as usize].map(|c| c as f32))))
            .collect();
        let bytes = encode_binary(&facets, "welded");
        prop_assert!(validate_bytes(&bytes).valid);

        let (repaired, report) = repair_bytes(&bytes).unwrap();
        prop_assert_eq!(repaired.vertices.len(), welded.vertices.len());
        prop_assert_eq!(repaired.faces.len(), welded.faces.len());
        prop_assert_eq!(report.dropped, 0);
    }
}
