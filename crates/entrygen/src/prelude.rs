//! The shared header every generated translation unit includes.
//!
//! Everything a shader body may name that is not its own (slot constants,
//! capacity macros, the `Uniform` record, output shapes, the name record and
//! its copy helper) is emitted here from the same registry the signatures are
//! built from.
use std::fmt::Write as _;

use shaderabi::{Environment, NameTableKind, SlotKind, SlotRegistry, NAME_CAPACITY};

use crate::stage::{OutputShape, RenderTargets};

pub const DEFAULT_HEADER: &str = "stagegen_common.h";

pub fn render_header(registry: &SlotRegistry) -> String {
    let capacities = registry.capacities();
    let mut out = String::new();

    let _ = writeln!(out, "// Generated by stagegen. Do not edit.");
    let _ = writeln!(out, "#ifndef STAGEGEN_COMMON_H");
    let _ = writeln!(out, "#define STAGEGEN_COMMON_H\n");
    let _ = writeln!(out, "#include <metal_stdlib>");
    let _ = writeln!(out, "using namespace metal;\n");

    let _ = writeln!(out, "#define STAGEGEN_REGISTRY_VERSION {}", registry.version());
    let _ = writeln!(out, "#define STAGEGEN_NAME_CAPACITY {NAME_CAPACITY}");
    let _ = writeln!(out, "#define TEXTURE_CAPACITY {}", capacities.textures);
    let _ = writeln!(out, "#define CUBE_CAPACITY {}", capacities.cubes);
    let _ = writeln!(out, "#define TEXT_CAPACITY {}", capacities.texts);
    let _ = writeln!(out, "#define VIDEO_CAPACITY {}\n", capacities.videos);

    for kind in SlotKind::ALL {
        let slot = registry.slot(kind);
        let _ = writeln!(out, "constant int {} = {};", kind.constant_name(), slot.index);
    }
    out.push('\n');

    out.push_str("struct Uniform {\n");
    for field in Environment::MSL_LAYOUT {
        let _ = writeln!(out, "  {} {};", field.ty, field.name);
    }
    out.push_str("};\n\n");

    out.push_str(
        "struct VertexOutTriangle {\n  float4 where [[position]];\n  float4 color;\n  float4 barrio;\n  int3 parm;\n};\n\n",
    );
    out.push_str(
        "struct VertexOutPoint {\n  float4 where [[position]];\n  float4 color;\n  float4 barrio;\n  int3 parm;\n  float point_size [[point_size]];\n};\n\n",
    );

    for targets in RenderTargets::ALL {
        out.push_str(&OutputShape::new(targets).render_msl());
        out.push('\n');
    }

    out.push_str("struct string {\n  char name[STAGEGEN_NAME_CAPACITY];\n};\n\n");
    out.push_str(
        "static inline void stagegen_copy_name(device string &record, constant char *source, uint length) {\n  for (uint i = 0; i < length; i++) {\n    record.name[i] = source[i];\n  }\n}\n\n",
    );
    out.push_str(
        "#define stringSet(record, literal) do { \\\n  static_assert(sizeof(literal) <= STAGEGEN_NAME_CAPACITY, \"label exceeds name capacity\"); \\\n  stagegen_copy_name(record, literal, sizeof(literal)); \\\n} while (0)\n\n",
    );
    for table in NameTableKind::ALL {
        let _ = writeln!(
            out,
            "#define {}(index, literal) stringSet(kbuff.{}[index], literal)",
            table.setter(),
            table.field()
        );
    }

    out.push_str("\n#endif\n");
    out
}

#[cfg(test)]
mod tests {
    use shaderabi::{ArrayCapacities, CANONICAL};

    use super::*;

    #[test]
    fn header_carries_slots_and_capacities() {
        let header = render_header(&CANONICAL);
        assert!(header.contains("#define STAGEGEN_REGISTRY_VERSION 1\n"));
        assert!(header.contains("constant int environmentSlot = 0;"));
        assert!(header.contains("constant int stateSlot = 3;"));
        assert!(header.contains("constant int renderOutputSlot = 30;"));
        assert!(header.contains("#define TEXTURE_CAPACITY 6\n"));
    }

    #[test]
    fn uniform_struct_follows_environment_layout() {
        let header = render_header(&CANONICAL);
        let start = header.find("struct Uniform {").unwrap();
        let block = &header[start..];
        let mut last = 0;
        for field in Environment::MSL_LAYOUT {
            let at = block.find(&format!(" {};", field.name)).unwrap();
            assert!(at > last, "{} out of order", field.name);
            last = at;
        }
    }

    #[test]
    fn every_output_shape_and_setter_is_declared() {
        let header = render_header(&CANONICAL);
        for targets in RenderTargets::ALL {
            assert!(header.contains(&OutputShape::new(targets).type_name()));
        }
        assert!(header.contains("#define setTex(index, literal) stringSet(kbuff.textures[index], literal)"));
        assert!(header.contains("#define setMusic(index, literal)"));
        assert!(header.contains("static_assert(sizeof(literal) <= STAGEGEN_NAME_CAPACITY"));
    }

    #[test]
    fn vertex_outputs_carry_interpolants_and_point_size() {
        let header = render_header(&CANONICAL);
        for name in ["VertexOutTriangle", "VertexOutPoint"] {
            let start = header.find(&format!("struct {name} {{")).unwrap();
            let block = &header[start..start + header[start..].find("};").unwrap()];
            assert!(block.contains("  float4 where [[position]];"), "{name}");
            assert!(block.contains("  float4 color;"), "{name}");
            assert!(block.contains("  float4 barrio;"), "{name}");
            assert!(block.contains("  int3 parm;"), "{name}");
        }
        assert!(header.contains("  float point_size [[point_size]];\n};"));
        assert!(!header.contains("pointsize"));
    }

    #[test]
    fn capacities_follow_the_registry() {
        let registry = SlotRegistry::with_capacities(ArrayCapacities {
            cubes: 2,
            ..ArrayCapacities::DEFAULT
        })
        .unwrap();
        assert!(render_header(&registry).contains("#define CUBE_CAPACITY 2\n"));
    }
}
