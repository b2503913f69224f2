//! Type expression resolution.
//!
//! Names resolve innermost first: type parameters and member types of the
//! enclosing declarations, then the toplevel declarations of every package
//! visible from the unit (its own package first, `lang` last). A name of
//! the form `pkg::Name` goes straight to that package, which must be
//! visible.

use crate::project::Project;
use crate::source::TypeExpr;
use crate::unit::{PhasedUnit, UnitState};
use lattice_common::limits::MAX_CANONICALIZATION_DEPTH;
use lattice_common::{Diagnostic, diagnostic_codes};
use lattice_solver::{
    DeclId, DeclarationGraph, ProducedType, RelationIssue, RelationIssueKind, TypeArgumentMap,
    TypeEngine,
};
use rustc_hash::FxHashSet;
use tracing::warn;

pub(crate) struct TypeResolver<'p> {
    project: &'p Project,
    graph: &'p DeclarationGraph,
    engine: TypeEngine<'p>,
    path: &'p str,
    visible: Vec<String>,
    /// Build unions and intersections through the engine. Off while the
    /// graph is still being wired.
    canonical: bool,
    depth: u32,
    diagnostics: Vec<Diagnostic>,
    references: FxHashSet<DeclId>,
}

impl<'p> TypeResolver<'p> {
    pub fn new(project: &'p Project, unit: &'p PhasedUnit) -> Self {
        TypeResolver {
            project,
            graph: project.graph(),
            engine: project.engine(),
            path: unit.path(),
            visible: project.registry().visible_packages(unit.package()),
            canonical: false,
            depth: 0,
            diagnostics: Vec::new(),
            references: FxHashSet::default(),
        }
    }

    pub fn canonical(mut self) -> Self {
        self.canonical = true;
        self
    }

    /// Resolve `expr` as seen from `scope`. Problems are reported under
    /// `subject`; without one they are dropped.
    pub fn resolve(
        &mut self,
        expr: &TypeExpr,
        scope: Option<DeclId>,
        subject: Option<&str>,
    ) -> ProducedType {
        let t = self.resolve_expr(expr, scope, subject, true);
        self.drain_issues(subject);
        t
    }

    /// Like [`resolve`](Self::resolve), except that an unknown outermost
    /// name is not reported. Wiring has already reported it.
    pub fn resolve_supertype(
        &mut self,
        expr: &TypeExpr,
        scope: Option<DeclId>,
        subject: &str,
    ) -> ProducedType {
        let t = self.resolve_expr(expr, scope, Some(subject), false);
        self.drain_issues(Some(subject));
        t
    }

    /// Hand the collected diagnostics and references to the unit.
    pub fn finish(self, state: &mut UnitState) {
        state.diagnostics.extend(self.diagnostics);
        state.references.extend(self.references);
    }

    pub fn lookup(&self, name: &str, scope: Option<DeclId>) -> Option<DeclId> {
        if let Some((package, simple)) = name.rsplit_once("::") {
            if !self.visible.iter().any(|p| p == package) {
                return None;
            }
            return self.graph.lookup_toplevel(package, simple);
        }
        let mut current = scope;
        while let Some(declaration) = current {
            let parameter = self
                .graph
                .type_parameters(declaration)
                .into_iter()
                .find(|p| &*self.graph.name(*p) == name);
            if parameter.is_some() {
                return parameter;
            }
            if let Some(member) = self.graph.direct_members_named(declaration, name).first() {
                return Some(*member);
            }
            current = self.graph.container(declaration);
        }
        self.visible
            .iter()
            .find_map(|package| self.graph.lookup_toplevel(package, name))
    }

    fn resolve_expr(
        &mut self,
        expr: &TypeExpr,
        scope: Option<DeclId>,
        subject: Option<&str>,
        report_head: bool,
    ) -> ProducedType {
        match expr {
            TypeExpr::Name(name) => self.resolve_named(name, &[], None, scope, subject, report_head),
            TypeExpr::Applied {
                name,
                args,
                qualifier,
            } => self.resolve_named(name, args, qualifier.as_deref(), scope, subject, report_head),
            TypeExpr::Union { union } => {
                let cases: Vec<ProducedType> = union
                    .iter()
                    .map(|case| self.resolve_expr(case, scope, subject, true))
                    .collect();
                self.union(cases)
            }
            TypeExpr::Intersection { intersection } => {
                let members: Vec<ProducedType> = intersection
                    .iter()
                    .map(|member| self.resolve_expr(member, scope, subject, true))
                    .collect();
                self.intersection(members)
            }
        }
    }

    fn resolve_named(
        &mut self,
        name: &str,
        args: &[TypeExpr],
        qualifier: Option<&TypeExpr>,
        scope: Option<DeclId>,
        subject: Option<&str>,
        report_head: bool,
    ) -> ProducedType {
        let qualifying = match qualifier {
            Some(qualifier) => {
                let q = self.resolve_expr(qualifier, scope, subject, true);
                if q.is_unknown() {
                    return q;
                }
                Some(q)
            }
            None => None,
        };
        let found = match &qualifying {
            Some(q) => q
                .declaration()
                .and_then(|d| self.graph.direct_members_named(d, name).first().copied()),
            None => self.lookup(name, scope),
        };
        let Some(declaration) = found else {
            if report_head {
                self.report(subject, diagnostic_codes::TYPE_NOT_FOUND, &[name]);
            }
            return ProducedType::unknown();
        };
        if !self
            .graph
            .kind(declaration)
            .is_some_and(|k| k.is_type_declaration())
        {
            self.report(subject, diagnostic_codes::NOT_A_TYPE, &[name]);
            return ProducedType::unknown();
        }
        self.note_reference(declaration, scope);
        if self.graph.is_type_parameter(declaration) {
            if !args.is_empty() {
                let found = args.len().to_string();
                self.report(
                    subject,
                    diagnostic_codes::WRONG_TYPE_ARGUMENT_COUNT,
                    &[name, "0", found.as_str()],
                );
                return ProducedType::unknown();
            }
            return ProducedType::of(declaration);
        }

        let parameters = self.graph.type_parameters(declaration);
        let required = parameters
            .iter()
            .filter(|p| !self.graph.is_defaulted(**p))
            .count();
        if args.len() > parameters.len() || args.len() < required {
            let expected = if required == parameters.len() {
                required.to_string()
            } else {
                format!("{required} to {}", parameters.len())
            };
            let found = args.len().to_string();
            self.report(
                subject,
                diagnostic_codes::WRONG_TYPE_ARGUMENT_COUNT,
                &[name, expected.as_str(), found.as_str()],
            );
            return ProducedType::unknown();
        }

        let mut arguments = Vec::with_capacity(parameters.len());
        let mut bindings = TypeArgumentMap::default();
        for (i, parameter) in parameters.iter().enumerate() {
            let argument = match args.get(i) {
                Some(arg) => Some(self.resolve_expr(arg, scope, subject, true)),
                None => self.default_argument(*parameter, &bindings),
            };
            if let Some(argument) = &argument {
                bindings.insert(*parameter, argument.clone());
            }
            arguments.push(argument);
        }
        let qualifying = qualifying.or_else(|| {
            if self.graph.is_member(declaration) {
                self.graph
                    .container(declaration)
                    .map(|c| self_type(self.graph, c))
            } else {
                None
            }
        });
        ProducedType::declared(declaration, arguments, qualifying)
    }

    /// The default argument of `parameter`, with the arguments bound so
    /// far substituted into it.
    fn default_argument(
        &mut self,
        parameter: DeclId,
        bindings: &TypeArgumentMap,
    ) -> Option<ProducedType> {
        let default = self.project.default_of(parameter)?;
        if self.depth >= MAX_CANONICALIZATION_DEPTH {
            warn!(
                parameter = %self.graph.qualified_name(parameter),
                "default type argument nests too deeply"
            );
            return Some(ProducedType::unknown());
        }
        let unit = self.project.unit(default.unit)?;
        let owner = self.graph.container(parameter);
        let mut nested = TypeResolver::new(self.project, unit);
        nested.canonical = self.canonical;
        nested.depth = self.depth + 1;
        let t = nested.resolve_expr(&default.expression, owner, None, false);
        Some(self.engine.substitute_internal(&t, bindings))
    }

    fn union(&mut self, cases: Vec<ProducedType>) -> ProducedType {
        match cases.len() {
            0 => ProducedType::nothing(),
            1 => cases.into_iter().next().unwrap_or_else(ProducedType::nothing),
            _ if self.canonical => self.engine.union_of(cases),
            _ => ProducedType::union_unchecked(cases),
        }
    }

    fn intersection(&mut self, members: Vec<ProducedType>) -> ProducedType {
        match members.len() {
            0 => self.graph.anything_type(),
            1 => members
                .into_iter()
                .next()
                .unwrap_or_else(|| self.graph.anything_type()),
            _ if self.canonical => self.engine.intersection_of(members),
            _ => ProducedType::intersection_unchecked(members),
        }
    }

    /// References from inside a declaration to itself are not uses.
    fn note_reference(&mut self, declaration: DeclId, scope: Option<DeclId>) {
        let mut current = scope;
        while let Some(enclosing) = current {
            if enclosing == declaration {
                return;
            }
            current = self.graph.container(enclosing);
        }
        if !self.graph.is_type_parameter(declaration) {
            self.references.insert(declaration);
        }
    }

    fn report(&mut self, subject: Option<&str>, code: u32, args: &[&str]) {
        if let Some(subject) = subject {
            self.diagnostics
                .push(Diagnostic::from_code(self.path, code, args).with_subject(subject));
        }
    }

    fn drain_issues(&mut self, subject: Option<&str>) {
        for issue in self.engine.take_issues() {
            if let Some(subject) = subject {
                self.diagnostics
                    .push(issue_diagnostic(self.path, subject, &issue));
            }
        }
    }
}

/// A declaration applied to its own type parameters, qualified by the
/// self type of its container when it is a member type.
pub(crate) fn self_type(graph: &DeclarationGraph, declaration: DeclId) -> ProducedType {
    let arguments = graph
        .type_parameters(declaration)
        .into_iter()
        .map(|p| Some(ProducedType::of(p)));
    let qualifying = if graph.is_member(declaration) {
        graph.container(declaration).map(|c| self_type(graph, c))
    } else {
        None
    };
    ProducedType::declared(declaration, arguments, qualifying)
}

pub(crate) fn issue_diagnostic(path: &str, subject: &str, issue: &RelationIssue) -> Diagnostic {
    let diagnostic = match issue.kind {
        RelationIssueKind::Undecidable => Diagnostic::from_code(
            path,
            diagnostic_codes::UNDECIDABLE_TYPE_QUERY,
            &[issue.message.as_str()],
        ),
        RelationIssueKind::MissingTypeArgument => Diagnostic::error(
            path,
            issue.message.clone(),
            diagnostic_codes::MISSING_TYPE_ARGUMENT,
        ),
    };
    diagnostic.with_subject(subject)
}

/// Turn the engine's recovered failures into diagnostics of one unit.
pub(crate) fn drain_engine_issues(
    engine: &mut TypeEngine<'_>,
    state: &mut UnitState,
    path: &str,
    subject: &str,
) {
    for issue in engine.take_issues() {
        warn!(unit = path, subject, message = %issue.message, "type query failed");
        state.diagnostics.add(issue_diagnostic(path, subject, &issue));
    }
}

#[cfg(test)]
#[path = "../tests/resolve_tests.rs"]
mod tests;
