//! Coordinate system markers.
//!
//! Every vector, matrix and rotation in this crate carries one of these
//! zero-sized tags as a type parameter. Arithmetic is only defined between
//! quantities with equal tags, so a world-space force can never be added to a
//! body-space arm by accident. Converting between frames always goes through a
//! [`RotationQuaternion`](crate::RotationQuaternion), a
//! [`Placement`](crate::Placement) or an explicit `reframe()` call.

use std::fmt::Debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A reference frame tag.
pub trait CoordinateSystem:
    Copy + Clone + Debug + Default + PartialEq + Send + Sync + 'static
{
    /// Human-readable frame name used in `Display` output.
    const NAME: &'static str;
}

macro_rules! coordinate_system {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name;

        impl CoordinateSystem for $name {
            const NAME: &'static str = stringify!($name);
        }
    };
}

coordinate_system!(
    /// Inertial simulation frame.
    WorldSpace
);

coordinate_system!(
    /// Body frame centred on the center of mass, axes fixed to the body.
    BodyCom
);

coordinate_system!(
    /// Body modelling frame in which shapes and attachment points are authored.
    BodyOrigin
);

coordinate_system!(
    /// Aircraft structural frame (X forward, Y right, Z down).
    Airframe
);

coordinate_system!(
    /// Earth-centred, Earth-fixed frame.
    Ecef
);
