//! Fixed-point numbers for the few non-integer values the core carries.
//!
//! Battle logic is integer-only. Cell heights are cosmetic but still travel
//! through the core (scenarios, events), so they use fixed-point to keep
//! every serialized battle bit-identical across platforms.

use fixed::types::I32F32;

/// Fixed-point number type used for cosmetic values such as cell height.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Cell heights on the wire, as whole tenths of a tile.
///
/// Heights are only ever built by [`height_tenths`], so the integer form is
/// exact and reads naturally in RON.
pub mod height_serde {
    use super::{height_tenths, to_tenths, Fixed};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Write `height` as tenths.
    pub fn serialize<S: Serializer>(height: &Fixed, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(to_tenths(*height))
    }

    /// Read a height written by [`serialize`].
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fixed, D::Error> {
        i32::deserialize(deserializer).map(height_tenths)
    }
}

/// Build a height from tenths of a tile, e.g. `height_tenths(15)` is 1.5.
#[must_use]
pub fn height_tenths(tenths: i32) -> Fixed {
    Fixed::from_num(tenths) / Fixed::from_num(10)
}

/// Nearest whole number of tenths in `height`.
#[must_use]
pub fn to_tenths(height: Fixed) -> i32 {
    (height * Fixed::from_num(10)).round().to_num()
}
