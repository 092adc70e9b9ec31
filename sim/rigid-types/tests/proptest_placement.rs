//! Property-based tests for frame transforms.
//!
//! Run with: cargo test -p rigid-types -- proptest

use proptest::prelude::*;
use rigid_types::{BodyCom, Placement, RotationQuaternion, SpaceVector, WorldSpace};

// =============================================================================
// Strategies
// =============================================================================

fn arb_components() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-1000.0..1000.0f64)
}

fn arb_placement() -> impl Strategy<Value = Placement<WorldSpace, BodyCom>> {
    (arb_components(), prop::array::uniform3(-4.0..4.0f64)).prop_map(|([x, y, z], [rx, ry, rz])| {
        Placement::new(
            SpaceVector::new(x, y, z),
            RotationQuaternion::from_rotation_vector(SpaceVector::new(rx, ry, rz)),
        )
    })
}

fn close(a: SpaceVector<BodyCom>, b: SpaceVector<BodyCom>) -> bool {
    (a - b).norm() <= 1e-9 * (1.0 + b.norm())
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_bound_round_trip(placement in arb_placement(), [x, y, z] in arb_components()) {
        let v = SpaceVector::<BodyCom>::new(x, y, z);
        let back = placement.bound_transform_to_body(placement.bound_transform_to_base(v));
        prop_assert!(close(back, v), "{back} != {v}");
    }

    #[test]
    fn proptest_unbound_round_trip(placement in arb_placement(), [x, y, z] in arb_components()) {
        let v = SpaceVector::<BodyCom>::new(x, y, z);
        let back = placement.unbound_transform_to_body(placement.unbound_transform_to_base(v));
        prop_assert!(close(back, v), "{back} != {v}");
    }

    #[test]
    fn proptest_unbound_transform_preserves_length(placement in arb_placement(), [x, y, z] in arb_components()) {
        let v = SpaceVector::<BodyCom>::new(x, y, z);
        let world = placement.unbound_transform_to_base(v);
        prop_assert!((world.norm() - v.norm()).abs() <= 1e-9 * (1.0 + v.norm()));
    }
}
