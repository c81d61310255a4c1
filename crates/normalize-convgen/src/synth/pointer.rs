use super::{Factory, Tried};
use crate::plan::{Plan, PointerPlan};
use crate::schema::Type;

/// Remove one pointer level from `ty`, if it has one.
fn peel(ty: &Type) -> &Type {
    match ty {
        Type::Pointer(elem) => elem,
        other => other,
    }
}

impl Factory<'_> {
    /// Peel one level from each pointer side and convert what is beneath.
    /// Deeper levels are handled by the recursion.
    pub(super) fn try_pointer(&self, x: &Type, y: &Type) -> Tried {
        if !x.is_pointer() && !y.is_pointer() {
            return Ok(None);
        }
        let (elem_x, elem_y) = (peel(x), peel(y));
        let elem = self.build(elem_x, elem_y, None)?;
        Ok(Some(pointer_plan(x, y, elem)))
    }

    /// Record conversion behind pointers, for top-level record requests.
    pub(super) fn try_record_pointer(&self, x: &Type, y: &Type) -> Tried {
        if !x.is_pointer() && !y.is_pointer() {
            return Ok(None);
        }
        let (elem_x, elem_y) = (peel(x), peel(y));
        let elem = match self.try_record(elem_x, elem_y)? {
            Some(plan) => plan,
            None => match self.try_record_pointer(elem_x, elem_y)? {
                Some(plan) => plan,
                None => return Ok(None),
            },
        };
        Ok(Some(pointer_plan(x, y, elem)))
    }
}

fn pointer_plan(x: &Type, y: &Type, elem: Plan) -> Plan {
    Plan::Pointer(PointerPlan {
        source_depth: x.pointer_depth(),
        target_depth: y.pointer_depth(),
        target_elem: peel(y).clone(),
        elem: Box::new(elem),
    })
}
