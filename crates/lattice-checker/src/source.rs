//! Serialized output of the parse and declare pass.
//!
//! The analyses in this crate never see concrete syntax. A unit arrives
//! as a [`UnitSource`]: its package, the declarations it contains and the
//! statements later phases verify. Type references are [`TypeExpr`]s and
//! are resolved against the declaration graph during type scanning.

use lattice_solver::Variance;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One compilation unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSource {
    pub path: String,
    pub package: String,
    /// Module the unit claims to belong to. Defaults to the module owning
    /// the package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default)]
    pub declarations: Vec<DeclSource>,
    #[serde(default)]
    pub checks: Vec<CheckSource>,
}

impl UnitSource {
    pub fn new(path: impl Into<String>, package: impl Into<String>) -> Self {
        UnitSource {
            path: path.into(),
            package: package.into(),
            module: None,
            declarations: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn declare(mut self, declaration: DeclSource) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn check(mut self, check: CheckSource) -> Self {
        self.checks.push(check);
        self
    }

    /// Last path component.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclSourceKind {
    Class,
    Interface,
    Alias,
    ClassAlias,
    InterfaceAlias,
    Function,
    Value,
}

impl DeclSourceKind {
    pub fn is_type(self) -> bool {
        !matches!(self, DeclSourceKind::Function | DeclSourceKind::Value)
    }

    pub fn is_alias(self) -> bool {
        matches!(
            self,
            DeclSourceKind::Alias | DeclSourceKind::ClassAlias | DeclSourceKind::InterfaceAlias
        )
    }
}

/// A declaration and its nested members.
///
/// `type` is the aliased type of an alias, the return type of a function
/// and the type of a value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclSource {
    pub name: String,
    pub kind: DeclSourceKind,
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub type_parameters: Vec<TypeParamSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<TypeExpr>,
    #[serde(default)]
    pub satisfies: Vec<TypeExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cases: Option<Vec<TypeExpr>>,
    #[serde(default)]
    pub members: Vec<DeclSource>,
    #[serde(default)]
    pub parameters: Vec<TypeExpr>,
    #[serde(default)]
    pub sequenced: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<TypeExpr>,
}

impl DeclSource {
    pub fn new(name: impl Into<String>, kind: DeclSourceKind) -> Self {
        DeclSource {
            name: name.into(),
            kind,
            is_abstract: false,
            shared: false,
            type_parameters: Vec::new(),
            extends: None,
            satisfies: Vec::new(),
            cases: None,
            members: Vec::new(),
            parameters: Vec::new(),
            sequenced: false,
            type_: None,
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, DeclSourceKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, DeclSourceKind::Interface)
    }

    pub fn alias(name: impl Into<String>, definition: TypeExpr) -> Self {
        Self::new(name, DeclSourceKind::Alias).typed(definition)
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::new(name, DeclSourceKind::Function)
    }

    pub fn value(name: impl Into<String>, value_type: TypeExpr) -> Self {
        Self::new(name, DeclSourceKind::Value).typed(value_type)
    }

    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    pub fn abstracted(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn extends(mut self, extended: TypeExpr) -> Self {
        self.extends = Some(extended);
        self
    }

    pub fn satisfies(mut self, satisfied: TypeExpr) -> Self {
        self.satisfies.push(satisfied);
        self
    }

    pub fn cases(mut self, cases: Vec<TypeExpr>) -> Self {
        self.cases = Some(cases);
        self
    }

    pub fn type_parameter(mut self, parameter: TypeParamSource) -> Self {
        self.type_parameters.push(parameter);
        self
    }

    pub fn member(mut self, member: DeclSource) -> Self {
        self.members.push(member);
        self
    }

    pub fn parameter(mut self, parameter: TypeExpr) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn sequenced(mut self) -> Self {
        self.sequenced = true;
        self
    }

    pub fn typed(mut self, type_: TypeExpr) -> Self {
        self.type_ = Some(type_);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeParamSource {
    pub name: String,
    #[serde(default)]
    pub variance: Variance,
    #[serde(default)]
    pub defaulted: bool,
    /// Default argument, used when an instantiation omits this parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<TypeExpr>,
    #[serde(default)]
    pub satisfies: Vec<TypeExpr>,
}

impl TypeParamSource {
    pub fn new(name: impl Into<String>, variance: Variance) -> Self {
        TypeParamSource {
            name: name.into(),
            variance,
            defaulted: false,
            default: None,
            satisfies: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: TypeExpr) -> Self {
        self.defaulted = true;
        self.default = Some(default);
        self
    }

    pub fn bounded(mut self, bound: TypeExpr) -> Self {
        self.satisfies.push(bound);
        self
    }

    pub fn is_defaulted(&self) -> bool {
        self.defaulted || self.default.is_some()
    }
}

// =============================================================================
// Type expressions
// =============================================================================

/// A type as written. Names are simple (`Dog`) or package-qualified
/// (`zoo.pets::Dog`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    Name(String),
    Union {
        union: Vec<TypeExpr>,
    },
    Intersection {
        intersection: Vec<TypeExpr>,
    },
    Applied {
        name: String,
        #[serde(default)]
        args: Vec<TypeExpr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        qualifier: Option<Box<TypeExpr>>,
    },
}

impl TypeExpr {
    pub fn name(name: impl Into<String>) -> Self {
        TypeExpr::Name(name.into())
    }

    pub fn applied(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Applied {
            name: name.into(),
            args,
            qualifier: None,
        }
    }

    pub fn member(qualifier: TypeExpr, name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Applied {
            name: name.into(),
            args,
            qualifier: Some(Box::new(qualifier)),
        }
    }

    pub fn union(cases: Vec<TypeExpr>) -> Self {
        TypeExpr::Union { union: cases }
    }

    pub fn intersection(members: Vec<TypeExpr>) -> Self {
        TypeExpr::Intersection {
            intersection: members,
        }
    }

    /// The referenced declaration name, if this names one.
    pub fn head(&self) -> Option<&str> {
        match self {
            TypeExpr::Name(name) | TypeExpr::Applied { name, .. } => Some(name),
            TypeExpr::Union { .. } | TypeExpr::Intersection { .. } => None,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Name(name) => f.write_str(name),
            TypeExpr::Union { union } => join(f, union, "|"),
            TypeExpr::Intersection { intersection } => join(f, intersection, "&"),
            TypeExpr::Applied {
                name,
                args,
                qualifier,
            } => {
                if let Some(qualifier) = qualifier {
                    write!(f, "{qualifier}.")?;
                }
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    join(f, args, ",")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, types: &[TypeExpr], separator: &str) -> fmt::Result {
    for (i, t) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{t}")?;
    }
    Ok(())
}

// =============================================================================
// Checks
// =============================================================================

/// A statement verified by the type and flow phases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
    Assignable {
        from: TypeExpr,
        to: TypeExpr,
    },
    Exactly {
        left: TypeExpr,
        right: TypeExpr,
    },
    Member {
        receiver: TypeExpr,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Vec<TypeExpr>>,
        #[serde(default)]
        spread: bool,
    },
    Switch {
        subject: TypeExpr,
        cases: Vec<TypeExpr>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckSource {
    #[serde(flatten)]
    pub check: Check,
    /// The statement is expected to be rejected.
    #[serde(default)]
    pub expect_error: bool,
}

impl CheckSource {
    pub fn new(check: Check) -> Self {
        CheckSource {
            check,
            expect_error: false,
        }
    }

    pub fn assignable(from: TypeExpr, to: TypeExpr) -> Self {
        Self::new(Check::Assignable { from, to })
    }

    pub fn exactly(left: TypeExpr, right: TypeExpr) -> Self {
        Self::new(Check::Exactly { left, right })
    }

    pub fn member(receiver: TypeExpr, name: impl Into<String>, arguments: Option<Vec<TypeExpr>>) -> Self {
        Self::new(Check::Member {
            receiver,
            name: name.into(),
            arguments,
            spread: false,
        })
    }

    pub fn switch(subject: TypeExpr, cases: Vec<TypeExpr>) -> Self {
        Self::new(Check::Switch { subject, cases })
    }

    pub fn expecting_error(mut self) -> Self {
        self.expect_error = true;
        self
    }

    /// Subject under which this check's diagnostics are reported.
    pub fn subject(index: usize) -> String {
        format!("check #{index}")
    }

    /// Inverse of [`subject`](Self::subject).
    pub fn index_of(subject: &str) -> Option<usize> {
        subject.strip_prefix("check #")?.parse().ok()
    }
}

#[cfg(test)]
#[path = "../tests/source_tests.rs"]
mod tests;
