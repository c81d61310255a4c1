//! User-supplied conversion functions.

use super::{Factory, Tried};
use crate::config::{FuncRef, MatchFunc};
use crate::error::Error;
use crate::plan::Plan;
use crate::schema::{SourceMap, Type};
use indexmap::IndexMap;

/// Functions registered for a module, one per exact type pair.
#[derive(Debug, Clone, Default)]
pub struct FuncTable {
    funcs: IndexMap<(Type, Type), FuncRef>,
}

impl FuncTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func`. A second function for the same pair is rejected and
    /// the first one stays.
    pub fn register(&mut self, func: FuncRef, sources: &SourceMap) -> Result<(), Error> {
        let key = (func.source.clone(), func.target.clone());
        if let Some(previous) = self.funcs.get(&key) {
            return Err(Error::DuplicateRegistration {
                source_ty: func.source,
                target_ty: func.target,
                previous: sources.display(previous.at),
                at: func.at,
            });
        }
        self.funcs.insert(key, func);
        Ok(())
    }

    pub fn get(&self, source: &Type, target: &Type) -> Option<&FuncRef> {
        self.funcs.get(&(source.clone(), target.clone()))
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl Factory<'_> {
    fn call(&self, name: &str, fallible: bool, x: &Type, y: &Type) -> Tried {
        if fallible && !self.allows_err {
            return Err(self.illegal(name, x, y).into());
        }
        let plan = Plan::Func {
            name: name.to_string(),
            fallible,
        };
        Ok(Some(self.wrap(plan)))
    }

    pub(super) fn try_match_func(&self, x: &Type, y: &Type, func: Option<&MatchFunc>) -> Tried {
        match func {
            Some(func) => self.call(&func.name, func.fallible, x, y),
            None => Ok(None),
        }
    }

    /// Functions imported by the active configuration come first, then the
    /// module table.
    pub(super) fn try_module_func(&self, x: &Type, y: &Type) -> Tried {
        let local = self
            .cfg
            .funcs
            .iter()
            .find(|f| &f.source == x && &f.target == y);
        match local.or_else(|| self.env.funcs.get(x, y)) {
            Some(func) => self.call(&func.name, func.fallible, x, y),
            None => Ok(None),
        }
    }
}
