//! Module registry.
//!
//! A module owns the packages whose names start with the module name. Units
//! are attached to the module owning their package; packages claimed by
//! no module belong to the implicit `default` module.

use crate::error::ProjectError;
use dashmap::DashMap;
use indexmap::IndexMap;
use lattice_solver::LANGUAGE_PACKAGE;
use serde::{Deserialize, Serialize};

/// Name of the module that owns otherwise unclaimed packages.
pub const DEFAULT_MODULE: &str = "default";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

/// Index of a unit in the batch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleImport {
    pub name: String,
    #[serde(default)]
    pub optional: bool,
}

impl ModuleImport {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleImport {
            name: name.into(),
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        ModuleImport {
            name: name.into(),
            optional: true,
        }
    }
}

/// A module descriptor as read from the project manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSource {
    pub name: String,
    #[serde(default)]
    pub imports: Vec<ModuleImport>,
    /// Directory holding the module's units, relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl ModuleSource {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleSource {
            name: name.into(),
            imports: Vec::new(),
            root: None,
        }
    }

    pub fn import(mut self, import: ModuleImport) -> Self {
        self.imports.push(import);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
    pub id: ModuleId,
    pub name: String,
    pub imports: Vec<ModuleImport>,
    pub packages: Vec<String>,
    pub units: Vec<UnitId>,
}

pub struct ModuleRegistry {
    modules: IndexMap<String, ModuleInfo>,
    /// Imported module to the units that depend on it. Filled by the
    /// module validator; ids only, never ownership.
    dependents: DashMap<ModuleId, Vec<UnitId>>,
}

impl ModuleRegistry {
    pub fn new(sources: &[ModuleSource]) -> Result<Self, ProjectError> {
        let mut modules: IndexMap<String, ModuleInfo> = IndexMap::new();
        for source in sources {
            if modules.contains_key(&source.name) {
                return Err(ProjectError::DuplicateModule(source.name.clone()));
            }
            let id = ModuleId(modules.len() as u32);
            modules.insert(
                source.name.clone(),
                ModuleInfo {
                    id,
                    name: source.name.clone(),
                    imports: source.imports.clone(),
                    packages: Vec::new(),
                    units: Vec::new(),
                },
            );
        }
        Ok(ModuleRegistry {
            modules,
            dependents: DashMap::new(),
        })
    }

    /// Attach a unit to its module, creating the default module on demand.
    pub fn admit(
        &mut self,
        unit: UnitId,
        path: &str,
        package: &str,
        module: Option<&str>,
    ) -> Result<ModuleId, ProjectError> {
        let name = match module {
            Some(module) => {
                let Some(info) = self.modules.get(module) else {
                    return Err(ProjectError::UnknownModule {
                        unit: path.to_string(),
                        module: module.to_string(),
                    });
                };
                if info.name != DEFAULT_MODULE && !in_hierarchy(&info.name, package) {
                    return Err(ProjectError::PackageOutsideModule {
                        unit: path.to_string(),
                        package: package.to_string(),
                        module: module.to_string(),
                    });
                }
                module.to_string()
            }
            None => self
                .owner_of(package)
                .unwrap_or(DEFAULT_MODULE)
                .to_string(),
        };
        let next_id = ModuleId(self.modules.len() as u32);
        let info = self.modules.entry(name.clone()).or_insert_with(|| ModuleInfo {
            id: next_id,
            name,
            imports: Vec::new(),
            packages: Vec::new(),
            units: Vec::new(),
        });
        if !info.packages.iter().any(|p| p == package) {
            info.packages.push(package.to_string());
        }
        info.units.push(unit);
        Ok(info.id)
    }

    /// The module with the longest name that is `package` or a prefix of
    /// it.
    fn owner_of(&self, package: &str) -> Option<&str> {
        self.modules
            .keys()
            .filter(|name| in_hierarchy(name, package))
            .max_by_key(|name| name.len())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.values()
    }

    pub fn get(&self, id: ModuleId) -> Option<&ModuleInfo> {
        self.modules.get_index(id.0 as usize).map(|(_, info)| info)
    }

    pub fn by_name(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules.get(name)
    }

    pub fn module_of_package(&self, package: &str) -> Option<ModuleId> {
        self.modules
            .values()
            .find(|info| info.packages.iter().any(|p| p == package))
            .map(|info| info.id)
    }

    /// Packages a unit of `package` may refer to: its own, the rest of its
    /// module, those of the modules it imports and the language package.
    pub fn visible_packages(&self, package: &str) -> Vec<String> {
        let mut visible = vec![package.to_string()];
        let mut push = |p: &str| {
            if !visible.iter().any(|v| v == p) {
                visible.push(p.to_string());
            }
        };
        if let Some(module) = self.module_of_package(package).and_then(|id| self.get(id)) {
            for p in &module.packages {
                push(p);
            }
            for import in &module.imports {
                if let Some(imported) = self.modules.get(&import.name) {
                    for p in &imported.packages {
                        push(p);
                    }
                }
            }
        }
        push(LANGUAGE_PACKAGE);
        visible
    }

    pub fn record_dependents(&self, module: ModuleId, units: &[UnitId]) {
        let mut entry = self.dependents.entry(module).or_default();
        for unit in units {
            if !entry.contains(unit) {
                entry.push(*unit);
            }
        }
    }

    /// Units whose module imports `module`.
    pub fn dependents_of(&self, module: ModuleId) -> Vec<UnitId> {
        self.dependents
            .get(&module)
            .map(|units| units.clone())
            .unwrap_or_default()
    }
}

/// Is `package` the module `module` or one of its subpackages?
pub fn in_hierarchy(module: &str, package: &str) -> bool {
    package == module
        || package
            .strip_prefix(module)
            .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
#[path = "../tests/module_tests.rs"]
mod tests;
