//! Sequences and maps.

use super::{Factory, Tried};
use crate::error::Errors;
use crate::plan::{AssociativePlan, Collection, KeySource, Plan, SequencePlan};
use crate::schema::{Primitive, Type};

impl Factory<'_> {
    /// Sequence to sequence, array to sequence, or array to array of the
    /// same length.
    pub(super) fn try_sequence(&self, x: &Type, y: &Type) -> Tried {
        let (source, target, elem_x, elem_y) = match (x, y) {
            (Type::Seq(ex), Type::Seq(ey)) => (Collection::Seq, Collection::Seq, ex, ey),
            (Type::Array(len, ex), Type::Seq(ey)) => {
                (Collection::Array { len: *len }, Collection::Seq, ex, ey)
            }
            (Type::Array(lx, ex), Type::Array(ly, ey)) if lx == ly => (
                Collection::Array { len: *lx },
                Collection::Array { len: *ly },
                ex,
                ey,
            ),
            _ => return Ok(None),
        };
        let elem = self.build(elem_x, elem_y, None)?;
        Ok(Some(Plan::Sequence(SequencePlan {
            source,
            target,
            elem: Box::new(elem),
        })))
    }

    /// Into a map, from a map or from a sequence keyed by position. Key and
    /// element failures are reported together.
    pub(super) fn try_associative(&self, x: &Type, y: &Type) -> Tried {
        let Type::Map(key_y, elem_y) = y else {
            return Ok(None);
        };
        let index = Type::Primitive(Primitive::Int);
        let (source, key_x, elem_x) = match x {
            Type::Map(key_x, elem_x) => (KeySource::Map, key_x.as_ref(), elem_x),
            Type::Seq(elem_x) | Type::Array(_, elem_x)
                if key_y.as_primitive().is_some_and(Primitive::is_integer) =>
            {
                (KeySource::Index, &index, elem_x)
            }
            _ => return Ok(None),
        };

        let mut errs = Errors::new();
        let elem = self.build(elem_x, elem_y, None).map_err(|e| errs.extend(e)).ok();
        let key = self.build(key_x, key_y, None).map_err(|e| errs.extend(e)).ok();
        let (Some(key), Some(elem)) = (key, elem) else {
            return Err(errs);
        };
        Ok(Some(Plan::Associative(AssociativePlan {
            source,
            key: Box::new(key),
            elem: Box::new(elem),
        })))
    }
}
