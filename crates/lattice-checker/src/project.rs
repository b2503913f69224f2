//! A batch of units sharing one declaration graph.

use crate::error::ProjectError;
use crate::module::{ModuleRegistry, ModuleSource, UnitId};
use crate::source::{TypeExpr, UnitSource};
use crate::unit::PhasedUnit;
use dashmap::DashMap;
use lattice_common::Diagnostic;
use lattice_solver::{DeclId, DeclarationGraph, SupertypeCache, TypeEngine, qualify};
use rustc_hash::FxHashMap;
use tracing::debug;

/// The default argument of a type parameter, resolved lazily in the
/// context of the unit that declared it.
#[derive(Clone, Debug)]
pub(crate) struct TypeDefault {
    pub unit: UnitId,
    pub expression: TypeExpr,
}

pub struct Project {
    graph: DeclarationGraph,
    cache: SupertypeCache,
    registry: ModuleRegistry,
    units: Vec<PhasedUnit>,
    defaults: DashMap<DeclId, TypeDefault>,
    /// Qualified toplevel name to the first unit, in input order, that
    /// declares it.
    owners: FxHashMap<String, UnitId>,
}

impl Project {
    /// Admit every unit to its module. Unit ids follow input order.
    pub fn new(modules: &[ModuleSource], sources: Vec<UnitSource>) -> Result<Self, ProjectError> {
        let mut registry = ModuleRegistry::new(modules)?;
        let mut units = Vec::with_capacity(sources.len());
        let mut owners = FxHashMap::default();
        for (index, source) in sources.into_iter().enumerate() {
            let id = UnitId(index as u32);
            for declaration in &source.declarations {
                owners
                    .entry(qualify(&source.package, &declaration.name))
                    .or_insert(id);
            }
            let module =
                registry.admit(id, &source.path, &source.package, source.module.as_deref())?;
            units.push(PhasedUnit::new(id, module, source));
        }
        debug!(
            units = units.len(),
            modules = registry.len(),
            "project assembled"
        );
        Ok(Project {
            graph: DeclarationGraph::new(),
            cache: SupertypeCache::new(),
            registry,
            units,
            defaults: DashMap::new(),
            owners,
        })
    }

    pub fn graph(&self) -> &DeclarationGraph {
        &self.graph
    }

    pub fn cache(&self) -> &SupertypeCache {
        &self.cache
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn units(&self) -> &[PhasedUnit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&PhasedUnit> {
        self.units.get(id.index())
    }

    pub fn unit_by_path(&self, path: &str) -> Option<&PhasedUnit> {
        self.units.iter().find(|u| u.path() == path)
    }

    /// A fresh engine over the shared graph and cache.
    pub fn engine(&self) -> TypeEngine<'_> {
        TypeEngine::with_cache(&self.graph, &self.cache)
    }

    /// Cut every supertype edge refinement flagged, in unit order. Refinement
    /// only records the edges, so every unit validates against the same
    /// graph regardless of scheduling.
    pub fn break_flagged_supertypes(&self) -> usize {
        let broken: usize = self
            .units
            .iter()
            .map(|u| u.break_flagged_supertypes(&self.graph))
            .sum();
        if broken > 0 {
            debug!(broken, "supertype edges cut");
        }
        broken
    }

    /// Every unit's diagnostics, in unit order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.units.iter().flat_map(|u| u.diagnostics()).collect()
    }

    /// The unit that owns the toplevel name `package::name`. Later units
    /// declaring the same name report a duplicate, whatever order the
    /// workers scan them in.
    pub fn toplevel_owner(&self, package: &str, name: &str) -> Option<UnitId> {
        self.owners.get(&qualify(package, name)).copied()
    }

    pub(crate) fn set_default(&self, parameter: DeclId, default: TypeDefault) {
        self.defaults.insert(parameter, default);
    }

    pub(crate) fn default_of(&self, parameter: DeclId) -> Option<TypeDefault> {
        self.defaults.get(&parameter).map(|d| d.clone())
    }
}
