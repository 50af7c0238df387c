//! `go.mod` parsing.
//!
//! Only the directives that affect where packages live are kept: `module`,
//! `go`, `require` and `replace`. Others (`exclude`, `retract`, `toolchain`,
//! `godebug`, `tool`) are accepted and ignored.
//!
//! ## Grammar
//!
//! ```text
//! <file>      := (<directive> | <block>)*
//! <directive> := verb <field>*
//! <block>     := verb "(" NEWLINE (<field>* NEWLINE)* ")"
//! <field>     := bare | "quoted" | `raw` | "=>"
//! ```
//!
//! Comments run from `//` to the end of the line.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use winnow::ascii::space0;
use winnow::combinator::{alt, delimited, preceded, repeat, terminated};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};
use winnow::ModalResult;

/// Error type for `go.mod` parsing.
#[derive(Debug, Error)]
pub enum GoModError {
    /// A directive is malformed.
    #[error("go.mod:{line}: {message}")]
    Syntax { line: usize, message: String },

    /// The file has no `module` directive.
    #[error("go.mod: no module directive")]
    MissingModule,

    /// The file could not be read.
    #[error("IO error reading go.mod: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed `go.mod` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoMod {
    /// The main module path.
    pub module: String,
    /// The `go` language version, if declared.
    pub go_version: Option<String>,
    pub requires: Vec<Require>,
    pub replaces: Vec<Replace>,
}

/// A `require` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Require {
    pub path: String,
    pub version: String,
}

/// A `replace` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replace {
    pub path: String,
    /// Only this version is replaced, when present.
    pub version: Option<String>,
    pub target: ReplaceTarget,
}

/// Where a `replace` directive points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplaceTarget {
    /// A directory, relative to the main module root or absolute.
    Dir(String),
    /// Another module version, found in the module cache.
    Module { path: String, version: String },
}

impl GoMod {
    /// Read and parse a `go.mod` file.
    pub fn load(path: &Path) -> Result<GoMod, GoModError> {
        let text = fs::read_to_string(path)?;
        parse_go_mod(&text)
    }

    /// The `require` directive whose module path is the longest prefix of
    /// `import_path`, with the remainder of the import path.
    pub fn require_for<'a, 'p>(&'a self, import_path: &'p str) -> Option<(&'a Require, &'p str)> {
        self.requires
            .iter()
            .filter_map(|r| strip_path_prefix(import_path, &r.path).map(|rest| (r, rest)))
            .max_by_key(|(r, _)| r.path.len())
    }

    /// The `replace` directive covering `import_path`, with the remainder of
    /// the import path.
    ///
    /// A version-specific replacement applies only when it names the version
    /// this module requires.
    pub fn replacement_for<'a, 'p>(&'a self, import_path: &'p str) -> Option<(&'a Replace, &'p str)> {
        self.replaces
            .iter()
            .filter_map(|r| strip_path_prefix(import_path, &r.path).map(|rest| (r, rest)))
            .filter(|(r, _)| match &r.version {
                None => true,
                Some(v) => self
                    .requires
                    .iter()
                    .any(|req| req.path == r.path && &req.version == v),
            })
            .max_by_key(|(r, _)| r.path.len())
    }
}

/// If `path` is `prefix` or lies under it, the remainder after `prefix/`.
pub(crate) fn strip_path_prefix<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    if path == prefix {
        return Some("");
    }
    path.strip_prefix(prefix)?.strip_prefix('/')
}

/// Parse the text of a `go.mod` file.
pub fn parse_go_mod(text: &str) -> Result<GoMod, GoModError> {
    let mut module = None;
    let mut go_version = None;
    let mut requires = Vec::new();
    let mut replaces = Vec::new();
    let mut block: Option<(String, usize)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let fields = parse_fields(strip_comment(raw)).map_err(|message| GoModError::Syntax {
            line,
            message,
        })?;
        if fields.is_empty() {
            continue;
        }

        let (verb, args) = match &block {
            Some((verb, _)) => {
                if fields.len() == 1 && fields[0] == ")" {
                    block = None;
                    continue;
                }
                (verb.clone(), fields.as_slice())
            }
            None => {
                let (verb, args) = fields.split_at(1);
                if args.len() == 1 && args[0] == "(" {
                    block = Some((verb[0].clone(), line));
                    continue;
                }
                (verb[0].clone(), args)
            }
        };

        let syntax = |message: &str| GoModError::Syntax {
            line,
            message: format!("{}: {}", verb, message),
        };
        match verb.as_str() {
            "module" => match args {
                [path] => module = Some(path.clone()),
                _ => return Err(syntax("usage: module module/path")),
            },
            "go" => match args {
                [version] => go_version = Some(version.clone()),
                _ => return Err(syntax("usage: go 1.23")),
            },
            "require" => match args {
                [path, version] => requires.push(Require {
                    path: path.clone(),
                    version: version.clone(),
                }),
                _ => return Err(syntax("usage: require module/path v1.2.3")),
            },
            "replace" => replaces.push(parse_replace(args).map_err(|m| syntax(&m))?),
            _ => {}
        }
    }

    if let Some((verb, line)) = block {
        return Err(GoModError::Syntax {
            line,
            message: format!("{}: unterminated block", verb),
        });
    }

    Ok(GoMod {
        module: module.ok_or(GoModError::MissingModule)?,
        go_version,
        requires,
        replaces,
    })
}

fn parse_replace(args: &[String]) -> Result<Replace, String> {
    let arrow = args
        .iter()
        .position(|a| a == "=>")
        .ok_or_else(|| "missing '=>'".to_string())?;
    let (old, new) = (&args[..arrow], &args[arrow + 1..]);
    let (path, version) = match old {
        [path] => (path.clone(), None),
        [path, version] => (path.clone(), Some(version.clone())),
        _ => return Err("usage: replace module/path [v1.2.3] => other/path [v1.2.3]".into()),
    };
    let target = match new {
        [dir] if is_local_dir(dir) => ReplaceTarget::Dir(dir.clone()),
        [_] => return Err("replacement module without version must be a directory path".into()),
        [path, version] => ReplaceTarget::Module {
            path: path.clone(),
            version: version.clone(),
        },
        _ => return Err("usage: replace module/path [v1.2.3] => other/path [v1.2.3]".into()),
    };
    Ok(Replace {
        path,
        version,
        target,
    })
}

fn is_local_dir(path: &str) -> bool {
    path.starts_with("./") || path.starts_with("../") || Path::new(path).is_absolute()
}

/// Drop a `//` comment, ignoring `//` inside quoted fields.
fn strip_comment(line: &str) -> &str {
    let mut quote = None;
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'`' => quote = Some(b),
            None if b == b'/' && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            None => {}
        }
    }
    line
}

fn parse_fields(line: &str) -> Result<Vec<String>, String> {
    fields
        .parse(line)
        .map_err(|_| "malformed quoted string".to_string())
}

// ============================================================================
// Parser implementation using winnow
// ============================================================================

/// All fields on a line.
fn fields(input: &mut &str) -> ModalResult<Vec<String>> {
    terminated(repeat(0.., preceded(space0, field)), space0).parse_next(input)
}

fn field(input: &mut &str) -> ModalResult<String> {
    alt((
        double_quoted,
        raw_quoted,
        take_while(1.., |c: char| !c.is_whitespace() && c != '"' && c != '`')
            .map(|s: &str| s.to_string()),
    ))
    .parse_next(input)
}

fn double_quoted(input: &mut &str) -> ModalResult<String> {
    delimited('"', take_till(0.., |c| c == '"'), '"')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

fn raw_quoted(input: &mut &str) -> ModalResult<String> {
    delimited('`', take_till(0.., |c| c == '`'), '`')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"// The main module.
module example.com/impl

go 1.22

require github.com/pkg/errors v0.9.1 // indirect

require (
	golang.org/x/tools v0.20.0
	"github.com/Azure/go-autorest" v14.2.0+incompatible
)

replace example.com/old => ../old

replace (
	golang.org/x/tools v0.20.0 => golang.org/x/tools v0.21.0
)

toolchain go1.22.3
"#;

    mod parsing {
        use super::*;

        #[test]
        fn full_file() {
            let m = parse_go_mod(SAMPLE).unwrap();
            assert_eq!(m.module, "example.com/impl");
            assert_eq!(m.go_version.as_deref(), Some("1.22"));
            assert_eq!(
                m.requires,
                vec![
                    Require {
                        path: "github.com/pkg/errors".into(),
                        version: "v0.9.1".into()
                    },
                    Require {
                        path: "golang.org/x/tools".into(),
                        version: "v0.20.0".into()
                    },
                    Require {
                        path: "github.com/Azure/go-autorest".into(),
                        version: "v14.2.0+incompatible".into()
                    },
                ]
            );
            assert_eq!(m.replaces.len(), 2);
            assert_eq!(m.replaces[0].target, ReplaceTarget::Dir("../old".into()));
            assert_eq!(
                m.replaces[1].target,
                ReplaceTarget::Module {
                    path: "golang.org/x/tools".into(),
                    version: "v0.21.0".into()
                }
            );
        }

        #[test]
        fn quoted_module_path() {
            let m = parse_go_mod("module \"example.com/q\"\n").unwrap();
            assert_eq!(m.module, "example.com/q");
        }

        #[test]
        fn missing_module_is_error() {
            assert!(matches!(
                parse_go_mod("go 1.21\n"),
                Err(GoModError::MissingModule)
            ));
        }

        #[test]
        fn unterminated_block_is_error() {
            let err = parse_go_mod("module m\n\nrequire (\n\ta v1.0.0\n").unwrap_err();
            assert!(matches!(err, GoModError::Syntax { line: 3, .. }));
        }

        #[test]
        fn bad_replace_is_error() {
            let err = parse_go_mod("module m\nreplace a => b\n").unwrap_err();
            assert!(matches!(err, GoModError::Syntax { line: 2, .. }));
        }

        #[test]
        fn comment_markers_inside_quotes_are_kept() {
            assert_eq!(strip_comment(r#"module "a//b" // c"#), r#"module "a//b" "#);
        }
    }

    mod lookup {
        use super::*;

        #[test]
        fn require_longest_prefix() {
            let m = parse_go_mod(
                "module m\nrequire (\n\texample.com/a v1.0.0\n\texample.com/a/b v1.1.0\n)\n",
            )
            .unwrap();
            let (req, rest) = m.require_for("example.com/a/b/c").unwrap();
            assert_eq!(req.path, "example.com/a/b");
            assert_eq!(rest, "c");
            let (req, rest) = m.require_for("example.com/a").unwrap();
            assert_eq!(req.path, "example.com/a");
            assert_eq!(rest, "");
            assert!(m.require_for("example.com/ab").is_none());
        }

        #[test]
        fn version_specific_replace_needs_matching_require() {
            let m = parse_go_mod(
                "module m\nrequire x.org/y v1.0.0\nreplace x.org/y v2.0.0 => ./y\n",
            )
            .unwrap();
            assert!(m.replacement_for("x.org/y/z").is_none());
            let m = parse_go_mod(
                "module m\nrequire x.org/y v1.0.0\nreplace x.org/y v1.0.0 => ./y\n",
            )
            .unwrap();
            let (r, rest) = m.replacement_for("x.org/y/z").unwrap();
            assert_eq!(r.target, ReplaceTarget::Dir("./y".into()));
            assert_eq!(rest, "z");
        }
    }
}
