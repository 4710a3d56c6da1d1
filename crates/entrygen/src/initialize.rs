//! Emission of the per-shader `InitializeOptions` kernel.
//!
//! The kernel value-initializes the shader's `KBuffer` (every field zero) and
//! then calls a static hook holding the unit's initializer body with the
//! environment and the zeroed state. The host dispatches it once, on a single
//! thread, before any other stage of that shader.
use crate::entry::{indent_body, EntryPoint};
use crate::identity::ShaderIdentity;

pub fn hook_name(identity: &ShaderIdentity) -> String {
    format!("initialize_{identity}")
}

pub(crate) fn render(entry: &EntryPoint) -> String {
    let hook = hook_name(&entry.identity);
    let hook_decl = format!("static void {hook}(constant Uniform &uni, device KBuffer &kbuff)");
    let body = indent_body(&entry.body);
    let body = if body.is_empty() {
        String::new()
    } else {
        format!("{body}\n")
    };
    format!(
        "{hook_decl};\n\n{decl} {{\n  kbuff = KBuffer();\n  {hook}(uni, kbuff);\n}}\n\n{hook_decl} {{\n{body}}}\n",
        decl = entry.signature.render_declaration(&entry.name),
    )
}
