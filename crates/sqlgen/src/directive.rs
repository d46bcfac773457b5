//! Directive extraction.
//!
//! A directive is a doc-comment line that starts with one of the configured
//! sigils, e.g. `/// sqlgen:model users`. This is the only place that decides
//! which comment belongs to which declaration: a directive on an inline module
//! scopes the group, a directive on an item inside it scopes that item.

use crate::decl::{DeclShape, Declaration};
use std::collections::BTreeMap;

/// A directive found on a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub sigil: String,
    /// Everything after the sigil on the directive line, untrimmed.
    pub raw_text: String,
}

impl Directive {
    /// Directive argument: the whitespace-trimmed text after the sigil.
    ///
    /// `None` when the text is empty or glued to the sigil (`sqlgen:modelx`).
    pub fn argument(&self) -> Option<&str> {
        if !self.raw_text.starts_with(char::is_whitespace) {
            return None;
        }
        let arg = self.raw_text.trim();
        (!arg.is_empty()).then_some(arg)
    }
}

/// One `(directive, declaration)` pair.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveMatch<'a> {
    pub directive: &'a Directive,
    pub shape: DeclShape,
    /// Empty for group-scoped matches.
    pub name: &'a str,
    pub decl: &'a Declaration,
}

/// Directives of one declaration.
#[derive(Debug, Clone)]
struct Found<'a> {
    decl: &'a Declaration,
    directives: Vec<Directive>,
}

/// Extraction result: matches grouped by sigil, each group in encounter order.
#[derive(Debug, Clone, Default)]
pub struct Directives<'a> {
    found: Vec<Found<'a>>,
}

impl<'a> Directives<'a> {
    /// Scan `decls` (and the members of inline groups) for directive lines.
    pub fn extract<I>(decls: I, sigils: &[&str]) -> Self
    where
        I: IntoIterator<Item = &'a Declaration>,
    {
        let mut found = Vec::new();
        for decl in decls {
            visit(decl, sigils, &mut found);
        }
        Self { found }
    }

    /// All matches in encounter order.
    pub fn iter(&self) -> impl Iterator<Item = DirectiveMatch<'_>> {
        self.found.iter().flat_map(|f| {
            f.directives.iter().map(move |directive| DirectiveMatch {
                directive,
                shape: f.decl.shape,
                name: if f.decl.shape.is_group() {
                    ""
                } else {
                    f.decl.ident.as_str()
                },
                decl: f.decl,
            })
        })
    }

    /// Matches for one sigil, in encounter order.
    pub fn for_sigil<'s>(&'s self, sigil: &'s str) -> impl Iterator<Item = DirectiveMatch<'s>> + 's {
        self.iter().filter(move |m| m.directive.sigil == sigil)
    }

    /// Matches grouped by sigil.
    pub fn by_sigil(&self) -> BTreeMap<&str, Vec<DirectiveMatch<'_>>> {
        let mut out: BTreeMap<&str, Vec<DirectiveMatch<'_>>> = BTreeMap::new();
        for m in self.iter() {
            out.entry(m.directive.sigil.as_str()).or_default().push(m);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }
}

fn visit<'a>(decl: &'a Declaration, sigils: &[&str], found: &mut Vec<Found<'a>>) {
    if let Some(doc) = decl.doc.as_deref() {
        let directives = parse_doc(doc, sigils);
        if !directives.is_empty() {
            found.push(Found { decl, directives });
        }
    }
    for member in &decl.members {
        visit(member, sigils, found);
    }
}

/// Directive lines of one doc comment, in line order.
pub fn parse_doc(doc: &str, sigils: &[&str]) -> Vec<Directive> {
    let mut out = Vec::new();
    for line in doc.lines() {
        let line = line.trim_start();
        // Longest sigil wins so `a:b` and `a:bc` can coexist.
        let best = sigils
            .iter()
            .filter(|s| !s.is_empty() && line.starts_with(**s))
            .max_by_key(|s| s.len());
        if let Some(sigil) = best {
            out.push(Directive {
                sigil: (*sigil).to_string(),
                raw_text: line[sigil.len()..].to_string(),
            });
        }
    }
    out
}
