//! Identity and numeric conversions between scalars.

use super::{Factory, Tried};
use crate::error::Error;
use crate::plan::Plan;
use crate::schema::{Family, Primitive, Type};

/// Whether converting `from` to `to` keeps every value.
///
/// Within one numeric family the target must be at least as wide. Unsigned
/// to signed needs the source to fit in half the target width, so that the
/// target's positive range covers it. Every other family change, and
/// anything involving strings or booleans, loses information.
pub fn is_lossless(from: Primitive, to: Primitive) -> bool {
    if from == to {
        return true;
    }
    let (Some(from_width), Some(to_width)) = (from.width(), to.width()) else {
        return false;
    };
    match (from.family(), to.family()) {
        (Family::Bool, _) | (_, Family::Bool) => false,
        (a, b) if a == b => to_width >= from_width,
        (Family::Unsigned, Family::Signed) => from_width <= to_width / 2,
        _ => false,
    }
}

fn is_numeric(p: Primitive) -> bool {
    matches!(
        p.family(),
        Family::Signed | Family::Unsigned | Family::Float | Family::Complex
    )
}

impl Factory<'_> {
    pub(super) fn try_primitive(&self, x: &Type, y: &Type) -> Tried {
        if x == y {
            if x.as_primitive().is_some() {
                return Ok(Some(Plan::Identity));
            }
            if self.env.universe.declaration_of(x).is_some_and(|d| d.is_enum()) {
                return Ok(Some(Plan::Identity));
            }
        }

        let (Some(from), Some(to)) = (x.as_primitive(), y.as_primitive()) else {
            return Ok(None);
        };
        // Integers have no single textual encoding.
        if from.is_integer() && to == Primitive::String {
            return Ok(None);
        }
        if !is_numeric(from) || !is_numeric(to) {
            return Ok(None);
        }
        if !is_lossless(from, to) {
            return Err(Error::LossyConversion {
                source_ty: x.clone(),
                target_ty: y.clone(),
                at: self.at,
            }
            .into());
        }
        Ok(Some(Plan::Numeric { from, to }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Primitive::*;

    #[test]
    fn test_same_family_widening() {
        assert!(is_lossless(Int8, Int16));
        assert!(is_lossless(Int32, Int));
        assert!(is_lossless(Uint16, Uint64));
        assert!(is_lossless(Float32, Float64));
        assert!(is_lossless(Complex64, Complex128));
        assert!(!is_lossless(Int64, Int32));
        assert!(!is_lossless(Float64, Float32));
    }

    #[test]
    fn test_unsigned_to_signed_needs_half_width() {
        assert!(is_lossless(Uint8, Int16));
        assert!(is_lossless(Uint16, Int));
        assert!(is_lossless(Uint32, Int64));
        assert!(!is_lossless(Uint8, Int8));
        assert!(!is_lossless(Uint32, Int32));
        assert!(!is_lossless(Uint64, Int64));
    }

    #[test]
    fn test_family_changes_are_lossy() {
        assert!(!is_lossless(Int8, Float64));
        assert!(!is_lossless(Float32, Int64));
        assert!(!is_lossless(Int8, Uint64));
        assert!(!is_lossless(Float32, Complex128));
        assert!(!is_lossless(Bool, Int8));
        assert!(!is_lossless(String, Int));
    }

    #[test]
    fn test_identity_is_lossless() {
        for p in Primitive::ALL {
            assert!(is_lossless(p, p));
        }
    }
}
