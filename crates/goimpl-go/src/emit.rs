//! Rendering stubs and assembling the destination file.

use goimpl_core::output::Implementation;
use goimpl_core::patch::apply_edits;
use goimpl_syntax::{format_source, print_signature, FuncType, TypeSpec};

use crate::error::{StubError, StubResult};
use crate::imports::import_edits;
use crate::program::GoFile;
use crate::rewrite::ImportTable;

/// A missing method with its signature rewritten for the destination file.
#[derive(Debug, Clone)]
pub struct Stub {
    pub name: String,
    pub sig: FuncType,
}

/// The receiver base of a stub: `Box[K, V]` for a generic type.
pub fn receiver_type(spec: &TypeSpec) -> String {
    let params: Vec<&str> = spec
        .type_params
        .iter()
        .flat_map(|p| p.names.iter().map(String::as_str))
        .collect();
    if params.is_empty() {
        spec.name.clone()
    } else {
        format!("{}[{}]", spec.name, params.join(", "))
    }
}

/// One stub declaration, newline terminated.
///
/// ```
/// use goimpl_go::emit::render_stub;
/// use goimpl_syntax::FuncType;
///
/// let stub = render_stub("Close", &FuncType::default(), "Goer", "Closer");
/// assert_eq!(
///     stub,
///     "// Close implements Closer\nfunc (*Goer) Close() {\n\tpanic(\"unimplemented\")\n}\n"
/// );
/// ```
pub fn render_stub(name: &str, sig: &FuncType, receiver: &str, interface: &str) -> String {
    format!(
        "// {name} implements {interface}\nfunc (*{receiver}) {name}{sig} {{\n\tpanic(\"unimplemented\")\n}}\n",
        name = name,
        interface = interface,
        receiver = receiver,
        sig = print_signature(sig),
    )
}

/// Append `stubs` to `dest`, add the imports the rewriter recorded, and run
/// the format pass over the result.
///
/// When formatting fails the unformatted file travels in the error.
pub fn emit(
    dest: &GoFile,
    dest_spec: &TypeSpec,
    interface: &str,
    stubs: &[Stub],
    imports: &ImportTable,
) -> StubResult<Implementation> {
    let receiver = receiver_type(dest_spec);
    let methods = stubs
        .iter()
        .map(|stub| render_stub(&stub.name, &stub.sig, &receiver, interface))
        .collect::<Vec<_>>()
        .join("\n");

    let added_imports = ImportTable::to_infos(imports.added());
    let edits = import_edits(&dest.ast, &dest.text, &added_imports);
    let mut content = apply_edits(&dest.text, &edits)
        .map_err(|e| StubError::Internal(format!("import edits for {}: {}", dest.path, e)))?;
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content.push('\n');
    content.push_str(&methods);

    let mut implementation = Implementation {
        file: dest.path.clone(),
        file_content: content,
        methods,
        added_imports,
        all_imports: ImportTable::to_infos(imports.entries()),
    };

    match format_source(&implementation.file_content) {
        Ok(formatted) => {
            implementation.file_content = formatted;
            Ok(implementation)
        }
        Err(e) => Err(StubError::Format {
            message: e.to_string(),
            partial: Box::new(implementation),
        }),
    }
}
