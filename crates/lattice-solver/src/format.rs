//! Human-readable rendering of produced types.
//!
//! Used by diagnostics and the assertion pass, so the output is stable:
//! `Box<Dog>`, `A|B`, `(A|B)&C`, `Outer<X>.Inner`.

use crate::def::DeclarationGraph;
use crate::types::{ProducedType, TypeKind};
use std::fmt;

pub struct TypePrinter<'g> {
    graph: &'g DeclarationGraph,
    qualified: bool,
}

impl<'g> TypePrinter<'g> {
    pub fn new(graph: &'g DeclarationGraph) -> Self {
        TypePrinter {
            graph,
            qualified: false,
        }
    }

    /// Prefix toplevel names with their package.
    pub fn qualified(mut self, qualified: bool) -> Self {
        self.qualified = qualified;
        self
    }

    pub fn print(&self, t: &ProducedType) -> String {
        let mut out = String::new();
        self.write(&mut out, t, false);
        out
    }

    /// A [`fmt::Display`] adapter for `t`.
    pub fn display<'a>(&'a self, t: &'a ProducedType) -> DisplayType<'a, 'g> {
        DisplayType { printer: self, t }
    }

    fn write(&self, out: &mut String, t: &ProducedType, in_intersection: bool) {
        match t.kind() {
            TypeKind::Nothing => out.push_str("Nothing"),
            TypeKind::Unknown => out.push_str("unknown"),
            TypeKind::Union(cases) => {
                if in_intersection {
                    out.push('(');
                }
                self.write_joined(out, cases, '|', false);
                if in_intersection {
                    out.push(')');
                }
            }
            TypeKind::Intersection(members) => self.write_joined(out, members, '&', true),
            TypeKind::Declared(declared) => {
                match &declared.qualifying {
                    Some(qualifying) => {
                        self.write(out, qualifying, true);
                        out.push('.');
                        out.push_str(&self.graph.name(declared.declaration));
                    }
                    None if self.qualified && self.graph.is_toplevel(declared.declaration) => {
                        out.push_str(&self.graph.qualified_name(declared.declaration));
                    }
                    None => out.push_str(&self.graph.name(declared.declaration)),
                }
                if declared.arguments.is_empty() {
                    return;
                }
                out.push('<');
                for (i, argument) in declared.arguments.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    match argument {
                        Some(argument) => self.write(out, argument, false),
                        None => out.push('?'),
                    }
                }
                out.push('>');
            }
        }
    }

    fn write_joined(
        &self,
        out: &mut String,
        types: &[ProducedType],
        separator: char,
        in_intersection: bool,
    ) {
        for (i, t) in types.iter().enumerate() {
            if i > 0 {
                out.push(separator);
            }
            self.write(out, t, in_intersection);
        }
    }
}

pub struct DisplayType<'a, 'g> {
    printer: &'a TypePrinter<'g>,
    t: &'a ProducedType,
}

impl fmt::Display for DisplayType<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.printer.print(self.t))
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
