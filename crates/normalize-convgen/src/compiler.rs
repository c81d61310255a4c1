//! Builds every request of every module.
//!
//! Each module gets one function table (its imports, the imports of its
//! overlays, and its requests) and one subplan registry that later requests
//! reuse. Subplan names are unique across the whole compilation.

use crate::config::{Config, FuncRef, Kind};
use crate::error::Errors;
use crate::module::{ConversionModule, Request, RequestKind};
use crate::plan::Plan;
use crate::schema::{Type, Universe};
use crate::synth::{Env, Factory, FuncTable, Namespace, Shape, Subplan, SubplanRegistry};
use serde::Serialize;
use std::cell::RefCell;

/// A synthesized request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub module: String,
    pub name: String,
    pub source: Type,
    pub target: Type,
    pub fallible: bool,
    pub plan: Plan,
}

/// Everything a code emitter needs: the requested conversions in order and
/// the subplans they call, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Output {
    pub conversions: Vec<Conversion>,
    pub subplans: Vec<Subplan>,
}

impl Output {
    pub fn conversion(&self, name: &str) -> Option<&Conversion> {
        self.conversions.iter().find(|c| c.name == name)
    }

    pub fn subplan(&self, name: &str) -> Option<&Subplan> {
        self.subplans.iter().find(|s| s.name == name)
    }

    /// Pretty JSON of every conversion and subplan.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub struct Compiler<'u> {
    universe: &'u Universe,
    modules: Vec<ConversionModule>,
}

impl<'u> Compiler<'u> {
    pub fn new(universe: &'u Universe) -> Self {
        Self {
            universe,
            modules: Vec::new(),
        }
    }

    pub fn module(mut self, module: ConversionModule) -> Self {
        self.modules.push(module);
        self
    }

    pub fn add_module(&mut self, module: ConversionModule) {
        self.modules.push(module);
    }

    /// Request names are taken before any subplan is named.
    fn namespace(&self) -> Namespace {
        let mut namespace = Namespace::new();
        for request in self.modules.iter().flat_map(|m| &m.requests) {
            namespace.reserve(&request.name);
        }
        namespace
    }

    pub fn compile(&self) -> Result<Output, Errors> {
        let namespace = RefCell::new(self.namespace());
        let mut errs = Errors::new();
        let mut output = Output::default();

        for module in &self.modules {
            let _span = tracing::debug_span!("module", name = %module.name).entered();
            let (cfg, funcs) = match self.prepare(module) {
                Ok(prepared) => prepared,
                Err(e) => {
                    errs.extend(e);
                    continue;
                }
            };
            let env = Env {
                universe: self.universe,
                module: &module.name,
                module_cfg: &cfg,
                funcs: &funcs,
                namespace: &namespace,
            };
            let mut registry = SubplanRegistry::new();

            for request in &module.requests {
                let _span = tracing::debug_span!("request", name = %request.name).entered();
                let req_cfg = match request_config(&cfg, request) {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        errs.extend(e);
                        continue;
                    }
                };
                let errorful = request.kind.errorful();
                let factory = Factory::new(&env, req_cfg, errorful, Some(&registry), request.at);
                match factory.build_request(&shape(&request.kind), &request.source, &request.target)
                {
                    Ok(plan) => {
                        tracing::debug!(strategy = plan.strategy(), "built conversion");
                        let created = factory.into_subplans();
                        registry.merge(created);
                        output.conversions.push(Conversion {
                            module: module.name.clone(),
                            name: request.name.clone(),
                            source: request.source.clone(),
                            target: request.target.clone(),
                            fallible: errorful,
                            plan,
                        });
                    }
                    Err(e) => errs.extend(e),
                }
            }
            output.subplans.extend(registry.into_sorted());
        }

        output.subplans.sort_by(|a, b| a.name.cmp(&b.name));
        errs.into_result(output)
    }

    /// The verdict table of one request, or `None` when its types are not of
    /// the requested kind.
    pub fn explain(&self, module: &str, request: &str) -> Result<Option<String>, Errors> {
        let Some(module) = self.modules.iter().find(|m| m.name == module) else {
            return Ok(None);
        };
        let Some(request) = module.requests.iter().find(|r| r.name == request) else {
            return Ok(None);
        };
        let (cfg, funcs) = self.prepare(module)?;
        let namespace = RefCell::new(self.namespace());
        let env = Env {
            universe: self.universe,
            module: &module.name,
            module_cfg: &cfg,
            funcs: &funcs,
            namespace: &namespace,
        };
        let req_cfg = request_config(&cfg, request)?;
        let factory = Factory::new(&env, req_cfg, request.kind.errorful(), None, request.at);
        factory.explain(&shape(&request.kind), &request.source, &request.target)
    }

    /// The module configuration and its function table.
    fn prepare(&self, module: &ConversionModule) -> Result<(Config, FuncTable), Errors> {
        let cfg = Config::from_directives(module.directives.iter().cloned())?;
        let sources = self.universe.source_map();

        let overlays = [Kind::Record, Kind::Union, Kind::Enum]
            .into_iter()
            .filter_map(|kind| cfg.overlay(kind))
            .flat_map(|overlay| overlay.funcs.iter().cloned());
        let requests = module.requests.iter().map(|r| FuncRef {
            name: r.name.clone(),
            source: r.source.clone(),
            target: r.target.clone(),
            fallible: r.kind.errorful(),
            at: r.at,
        });

        let mut funcs = FuncTable::new();
        let mut errs = Errors::new();
        for func in cfg.funcs.iter().cloned().chain(overlays).chain(requests) {
            if let Err(e) = funcs.register(func, sources) {
                errs.push(e);
            }
        }
        tracing::debug!(funcs = funcs.len(), "registered functions");
        errs.into_result((cfg, funcs))
    }
}

fn request_config(module_cfg: &Config, request: &Request) -> Result<Config, Errors> {
    let mut cfg = module_cfg.fork_for(request.kind.kind());
    for (directive, at) in &request.directives {
        cfg.apply(directive.clone(), *at)?;
    }
    Ok(cfg)
}

fn shape(kind: &RequestKind) -> Shape<'_> {
    match kind {
        RequestKind::Record | RequestKind::RecordErrorful => Shape::Record,
        RequestKind::Union | RequestKind::UnionErrorful => Shape::Union,
        RequestKind::Enum { default } | RequestKind::EnumErrorful { default } => {
            Shape::Enum { default }
        }
    }
}
