// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! gofmt-style printing of type expressions and signatures.
//!
//! Non-empty interface and struct literals print across several lines,
//! indented with tabs one level deeper than the line they open on.

use crate::ast::{ChanDir, Field, FuncType, InterfaceElem, Param, TypeExpr, UnionTerm};

/// Print a type expression at top-level indentation.
pub fn print_type(ty: &TypeExpr) -> String {
    let mut p = Printer::new(0);
    p.type_expr(ty);
    p.out
}

/// Print a signature as `(params) results`, as it follows a method name.
pub fn print_signature(sig: &FuncType) -> String {
    print_signature_indented(sig, 0)
}

/// Like [`print_signature`], for a declaration nested `indent` tabs deep.
pub fn print_signature_indented(sig: &FuncType, indent: usize) -> String {
    let mut p = Printer::new(indent);
    p.signature(sig);
    p.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new(indent: usize) -> Self {
        Printer {
            out: String::new(),
            indent,
        }
    }

    fn newline(&mut self, indent: usize) {
        self.out.push('\n');
        for _ in 0..indent {
            self.out.push('\t');
        }
    }

    /// Print into a fresh buffer at the current indent.
    fn render(&self, f: impl FnOnce(&mut Printer)) -> String {
        let mut p = Printer::new(self.indent);
        f(&mut p);
        p.out
    }

    fn type_expr(&mut self, ty: &TypeExpr) {
        match ty {
            TypeExpr::Name(n) => self.out.push_str(n),
            TypeExpr::Qualified { package, name } => {
                self.out.push_str(package);
                self.out.push('.');
                self.out.push_str(name);
            }
            TypeExpr::Generic { base, args } => {
                self.type_expr(base);
                self.out.push('[');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.type_expr(arg);
                }
                self.out.push(']');
            }
            TypeExpr::Pointer(inner) => {
                self.out.push('*');
                self.type_expr(inner);
            }
            TypeExpr::Slice(elem) => {
                self.out.push_str("[]");
                self.type_expr(elem);
            }
            TypeExpr::Array { len, elem } => {
                self.out.push('[');
                self.out.push_str(len);
                self.out.push(']');
                self.type_expr(elem);
            }
            TypeExpr::Map { key, value } => {
                self.out.push_str("map[");
                self.type_expr(key);
                self.out.push(']');
                self.type_expr(value);
            }
            TypeExpr::Chan { dir, elem } => {
                self.out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                let needs_parens = *dir != ChanDir::Recv
                    && matches!(elem.as_ref(), TypeExpr::Chan { dir: ChanDir::Recv, .. });
                if needs_parens {
                    self.out.push('(');
                    self.type_expr(elem);
                    self.out.push(')');
                } else {
                    self.type_expr(elem);
                }
            }
            TypeExpr::Func(sig) => {
                self.out.push_str("func");
                self.signature(sig);
            }
            TypeExpr::Interface(iface) => {
                if iface.elems.is_empty() {
                    self.out.push_str("interface{}");
                    return;
                }
                self.out.push_str("interface {");
                let outer = self.indent;
                self.indent += 1;
                for elem in &iface.elems {
                    self.newline(outer + 1);
                    match elem {
                        InterfaceElem::Method(m) => {
                            self.out.push_str(&m.name);
                            self.signature(&m.sig);
                        }
                        InterfaceElem::Embed(t) => self.type_expr(t),
                    }
                }
                self.indent = outer;
                self.newline(outer);
                self.out.push('}');
            }
            TypeExpr::Struct(st) => {
                if st.fields.is_empty() {
                    self.out.push_str("struct{}");
                    return;
                }
                self.out.push_str("struct {");
                let outer = self.indent;
                self.indent += 1;
                self.fields(&st.fields, outer + 1);
                self.indent = outer;
                self.newline(outer);
                self.out.push('}');
            }
            TypeExpr::Paren(inner) => {
                self.out.push('(');
                self.type_expr(inner);
                self.out.push(')');
            }
            TypeExpr::Ellipsis(elem) => {
                self.out.push_str("...");
                self.type_expr(elem);
            }
            TypeExpr::Union(terms) => self.union(terms),
        }
    }

    fn union(&mut self, terms: &[UnionTerm]) {
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                self.out.push_str(" | ");
            }
            if term.tilde {
                self.out.push('~');
            }
            self.type_expr(&term.ty);
        }
    }

    /// Struct fields with names and types aligned in columns.
    fn fields(&mut self, fields: &[Field], indent: usize) {
        let rendered: Vec<(String, String, Option<&str>)> = fields
            .iter()
            .map(|f| {
                let names = f.names.join(", ");
                let ty = self.render(|p| p.type_expr(&f.ty));
                (names, ty, f.tag.as_deref())
            })
            .collect();
        let name_width = rendered
            .iter()
            .filter(|(n, _, _)| !n.is_empty())
            .map(|(n, _, _)| n.chars().count())
            .max()
            .unwrap_or(0);
        let type_width = rendered
            .iter()
            .filter(|(_, t, tag)| tag.is_some() && !t.contains('\n'))
            .map(|(n, t, _)| {
                let lead = if n.is_empty() { 0 } else { name_width + 1 };
                lead + t.chars().count()
            })
            .max()
            .unwrap_or(0);

        for (names, ty, tag) in &rendered {
            self.newline(indent);
            let line_start = self.out.len();
            if !names.is_empty() {
                self.out.push_str(names);
                let pad = name_width - names.chars().count() + 1;
                self.out.push_str(&" ".repeat(pad));
            }
            self.out.push_str(ty);
            if let Some(tag) = tag {
                let used = self.out[line_start..].chars().count();
                let pad = type_width.saturating_sub(used) + 1;
                self.out.push_str(&" ".repeat(pad));
                self.out.push_str(tag);
            }
        }
    }

    fn signature(&mut self, sig: &FuncType) {
        self.params(&sig.params);
        match sig.results.as_slice() {
            [] => {}
            [single] if single.names.is_empty() => {
                self.out.push(' ');
                self.type_expr(&single.ty);
            }
            results => {
                self.out.push(' ');
                self.params(results);
            }
        }
    }

    fn params(&mut self, params: &[Param]) {
        self.out.push('(');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            if !param.names.is_empty() {
                self.out.push_str(&param.names.join(", "));
                self.out.push(' ');
            }
            self.type_expr(&param.ty);
        }
        self.out.push(')');
    }
}
