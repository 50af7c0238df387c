//! Inserting import specs into Go source text.
//!
//! New imports go where gofmt users expect them:
//!
//! - into the first parenthesized import block, within the group (run of
//!   specs without blank lines) whose paths share the longest prefix with
//!   the new path, at its sorted position;
//! - a lone `import "x"` becomes a parenthesized block holding all specs in
//!   path order;
//! - a file without imports gets a declaration after the package clause.
//!
//! A declaration importing `"C"` is never touched: cgo reads the comment
//! above a lone `import "C"` as its preamble. When no other declaration
//! exists, the new imports get their own declaration after it.

use goimpl_core::output::ImportInfo;
use goimpl_core::patch::{Span, TextEdit};
use goimpl_core::text::{line_end, line_start};
use goimpl_syntax::{ImportDecl, ImportSpec, SourceFile};

/// Format one spec as it appears in source.
pub fn spec_text(info: &ImportInfo) -> String {
    if info.is_named() {
        format!("{} \"{}\"", info.name, info.path)
    } else {
        format!("\"{}\"", info.path)
    }
}

/// Edits that add `added` to the imports of `file`, whose text is `source`.
pub fn import_edits(file: &SourceFile, source: &str, added: &[ImportInfo]) -> Vec<TextEdit> {
    if added.is_empty() {
        return Vec::new();
    }
    let mut added = added.to_vec();
    added.sort_by(|a, b| a.path.cmp(&b.path));

    let mut editable = file.imports.iter().filter(|d| !imports_cgo(d));
    if let Some(block) = editable.clone().find(|d| d.lparen.is_some()) {
        return block_edits(block, source, &added);
    }
    if let Some(single) = editable.next() {
        return vec![single_to_block(single, source, &added)];
    }
    let anchor = file
        .imports
        .last()
        .map_or(file.package_span.end, |decl| decl.span.end);
    vec![new_declaration(anchor, source, &added)]
}

fn imports_cgo(decl: &ImportDecl) -> bool {
    decl.specs.iter().any(|spec| spec.path == "C")
}

fn block_edits(block: &ImportDecl, source: &str, added: &[ImportInfo]) -> Vec<TextEdit> {
    let (Some(lparen), Some(rparen)) = (block.lparen, block.rparen) else {
        return Vec::new();
    };

    if block.specs.is_empty() {
        let body: String = added
            .iter()
            .map(|info| format!("\n\t{}", spec_text(info)))
            .collect();
        let inside = Span::new(lparen.end, rparen.start);
        if inside.slice(source).is_some_and(|s| s.trim().is_empty()) {
            return vec![TextEdit::replace(inside, format!("{}\n", body))];
        }
        return vec![TextEdit::insert(lparen.end, body)];
    }

    let groups = spec_groups(&block.specs, source);
    added
        .iter()
        .map(|info| {
            let group = best_group(&groups, &info.path);
            let text = spec_text(info);
            match group.iter().find(|spec| spec.path > info.path) {
                Some(spec) => TextEdit::insert(line_start(source, spec.span.start), format!("\t{}\n", text)),
                None => {
                    let last = group.last().map_or(lparen.end, |spec| line_end(source, spec.span.end));
                    TextEdit::insert(last, format!("\n\t{}", text))
                }
            }
        })
        .collect()
}

/// Split specs into runs separated by blank lines.
fn spec_groups<'a>(specs: &'a [ImportSpec], source: &str) -> Vec<&'a [ImportSpec]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..specs.len() {
        let between = Span::new(specs[i - 1].span.end, specs[i].span.start)
            .slice(source)
            .unwrap_or_default();
        if has_blank_line(between) {
            groups.push(&specs[start..i]);
            start = i;
        }
    }
    groups.push(&specs[start..]);
    groups
}

fn has_blank_line(between: &str) -> bool {
    let lines: Vec<&str> = between.split('\n').collect();
    lines.len() > 2 && lines[1..lines.len() - 1].iter().any(|l| l.trim().is_empty())
}

/// The group sharing the most leading path elements with `path`; the first
/// such group on ties.
fn best_group<'a>(groups: &[&'a [ImportSpec]], path: &str) -> &'a [ImportSpec] {
    let mut best: &'a [ImportSpec] = groups.first().copied().unwrap_or_default();
    let mut best_len = 0;
    for group in groups {
        let len = group
            .iter()
            .map(|spec| common_elements(&spec.path, path))
            .max()
            .unwrap_or(0);
        if len > best_len {
            best = *group;
            best_len = len;
        }
    }
    best
}

fn common_elements(a: &str, b: &str) -> usize {
    a.split('/')
        .zip(b.split('/'))
        .take_while(|(x, y)| x == y)
        .count()
}

/// A lone `import "x"` and any line comment after it become a block.
fn single_to_block(single: &ImportDecl, source: &str, added: &[ImportInfo]) -> TextEdit {
    let end = line_end(source, single.span.end);
    let comment = source
        .get(single.span.end..end)
        .map(str::trim)
        .filter(|rest| rest.starts_with("//"));
    let mut specs: Vec<(String, String)> = single
        .specs
        .iter()
        .map(|spec| {
            let mut text = spec.span.slice(source).unwrap_or_default().to_string();
            if let Some(comment) = comment {
                text = format!("{} {}", text, comment);
            }
            (spec.path.clone(), text)
        })
        .collect();
    specs.extend(added.iter().map(|info| (info.path.clone(), spec_text(info))));
    specs.sort_by(|a, b| a.0.cmp(&b.0));

    let body: String = specs
        .iter()
        .map(|(_, text)| format!("\t{}\n", text))
        .collect();
    let span = match comment {
        Some(_) => Span::new(single.span.start, end),
        None => single.span,
    };
    TextEdit::replace(span, format!("import (\n{})", body))
}

/// A fresh declaration on its own line after the line holding `anchor`.
fn new_declaration(anchor: usize, source: &str, added: &[ImportInfo]) -> TextEdit {
    let at = line_end(source, anchor);
    let text = match added {
        [one] => format!("\n\nimport {}", spec_text(one)),
        many => {
            let body: String = many
                .iter()
                .map(|info| format!("\t{}\n", spec_text(info)))
                .collect();
            format!("\n\nimport (\n{})", body)
        }
    };
    TextEdit::insert(at, text)
}
