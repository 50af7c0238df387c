// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Canonical format pass over generated Go source.
//!
//! The pass rejects text that does not parse and normalizes layout the way
//! gofmt does at file level:
//!
//! - CRLF line endings become LF.
//! - Trailing spaces and tabs are removed.
//! - Runs of blank lines collapse to one; leading and trailing blanks go.
//! - The file ends with exactly one newline.
//!
//! Raw string literals are left byte for byte, including blank lines and
//! trailing whitespace inside them. Declarations are expected to arrive already
//! laid out by [`crate::printer`]; this pass does not re-indent.

use goimpl_core::patch::Span;

use crate::error::FormatError;
use crate::lexer::{tokenize, Tok};
use crate::parser::parse_file;

/// Validate and normalize a Go source file.
pub fn format_source(text: &str) -> Result<String, FormatError> {
    let source = text.replace("\r\n", "\n");
    parse_file(&source)?;
    let raw_strings: Vec<Span> = tokenize(&source)?
        .into_iter()
        .filter(|t| t.kind == Tok::RawStringLit)
        .map(|t| t.span)
        .collect();
    let in_raw_string =
        |offset: usize| raw_strings.iter().any(|s| s.start < offset && offset < s.end);

    let mut out = String::with_capacity(source.len());
    let mut pending_blank = false;
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let body = line.strip_suffix('\n').unwrap_or(line);
        let starts_inside = in_raw_string(start);
        let kept = if in_raw_string(start + body.len()) {
            body
        } else {
            body.trim_end_matches([' ', '\t'])
        };

        if kept.is_empty() && !starts_inside {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(kept);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_whitespace() {
        let got = format_source("package p  \n\ntype T struct{}\t\n").unwrap();
        assert_eq!(got, "package p\n\ntype T struct{}\n");
    }

    #[test]
    fn collapses_blank_runs() {
        let got = format_source("\n\npackage p\n\n\n\ntype T int\n\n\n").unwrap();
        assert_eq!(got, "package p\n\ntype T int\n");
    }

    #[test]
    fn adds_final_newline() {
        assert_eq!(format_source("package p").unwrap(), "package p\n");
    }

    #[test]
    fn converts_crlf() {
        let got = format_source("package p\r\n\r\ntype T int\r\n").unwrap();
        assert_eq!(got, "package p\n\ntype T int\n");
    }

    #[test]
    fn raw_strings_are_untouched() {
        let src = "package p\n\nvar s = `a  \n\n\n\tb`\n";
        assert_eq!(format_source(src).unwrap(), src);
    }

    #[test]
    fn idempotent() {
        let src = "package p\n\n\nfunc (*T) M() {  \n\tpanic(\"unimplemented\")\n}\n\n";
        let once = format_source(src).unwrap();
        assert_eq!(format_source(&once).unwrap(), once);
    }

    #[test]
    fn syntax_error_is_located() {
        let err = format_source("package p\n\nfunc (*T) M( {\n").unwrap_err();
        assert_eq!(err.line, 3);
    }
}
