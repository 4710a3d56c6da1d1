//! Loads a shader unit directory and renders its translation unit.
//!
//! Types:
//!
//! - `UnitError` classifies manifest, generation and I/O failures.
//! - `ShaderUnit` holds the resolved identity, prelude and stage bodies.
//! - `GeneratedUnit` is the rendered `.metal` source plus the entry points it
//!   exports, ready for the dispatch table.
//!
//! Functions:
//!
//! - `ShaderUnit::load` reads `stage.toml`, validates it and resolves every
//!   stage body, failing when the unit has no identity unless
//!   `LoadOptions::derive_identity` is set.
//! - `ShaderUnit::generate` emits the entry points, verifies their signatures
//!   against the registry and renders the source.
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::entry::{EntryPoint, Generator};
use crate::error::GenerateError;
use crate::identity::{PassLabel, ShaderIdentity};
use crate::manifest::UnitManifest;
use crate::signature;
use crate::stage::{OutputShape, Stage};

pub const MANIFEST_FILE: &str = "stage.toml";

#[derive(Debug, Error)]
pub enum UnitError {
    #[error("manifest not found at {0}")]
    ManifestMissing(PathBuf),

    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] toml::de::Error),

    #[error("manifest validation failed: {0:?}")]
    ManifestValidation(Vec<String>),

    #[error("stage source not found at {0}")]
    SourceMissing(PathBuf),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Fall back to the directory name when the manifest has no identity.
    pub derive_identity: bool,
}

#[derive(Debug, Clone)]
struct StageSource {
    stage: Stage,
    pass: Option<PassLabel>,
    body: String,
}

#[derive(Debug, Clone)]
pub struct ShaderUnit {
    root: PathBuf,
    manifest: UnitManifest,
    identity: ShaderIdentity,
    prelude: Option<String>,
    stages: Vec<StageSource>,
}

impl ShaderUnit {
    pub fn load(root: impl AsRef<Path>, options: LoadOptions) -> Result<Self, UnitError> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(UnitError::ManifestMissing(manifest_path));
        }

        let manifest_raw = fs::read_to_string(&manifest_path)?;
        let manifest: UnitManifest = toml::from_str(&manifest_raw)?;
        Self::from_manifest(root, manifest, options)
    }

    pub fn from_manifest(
        root: PathBuf,
        manifest: UnitManifest,
        options: LoadOptions,
    ) -> Result<Self, UnitError> {
        let issues = manifest.validate();
        if !issues.is_empty() {
            return Err(UnitError::ManifestValidation(issues));
        }

        let identity = match manifest.identity.as_deref() {
            None if options.derive_identity => {
                let identity = ShaderIdentity::from_path(&root)?;
                tracing::info!(unit = %root.display(), identity = %identity, "derived identity from path");
                identity
            }
            declared => ShaderIdentity::require(declared, &root.display().to_string())?,
        };

        let prelude = match &manifest.prelude {
            Some(path) => Some(read_source(&root, path)?),
            None => None,
        };

        let mut stages = Vec::with_capacity(manifest.stages.len());
        for decl in &manifest.stages {
            let body = match (&decl.body, &decl.source) {
                (Some(body), _) => body.clone(),
                (None, Some(path)) => read_source(&root, path)?,
                (None, None) => String::new(),
            };
            stages.push(StageSource {
                stage: decl.stage()?,
                pass: decl.pass.clone().map(PassLabel::new).transpose()?,
                body,
            });
        }

        Ok(Self {
            root,
            manifest,
            identity,
            prelude,
            stages,
        })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn manifest(&self) -> &UnitManifest {
        &self.manifest
    }

    pub fn identity(&self) -> &ShaderIdentity {
        &self.identity
    }

    /// Emits every declared stage plus the initializer.
    ///
    /// Units that declare no initialize stage still get one with an empty
    /// hook, so every shader exports exactly one initializer.
    pub fn generate(
        &self,
        generator: &Generator<'_>,
        header: &str,
    ) -> Result<GeneratedUnit, GenerateError> {
        let mut entries: Vec<EntryPoint> = self
            .stages
            .iter()
            .map(|source| {
                generator.entry(&self.identity, source.pass.as_ref(), source.stage, &source.body)
            })
            .collect();
        if !entries.iter().any(|entry| entry.stage == Stage::Initialize) {
            entries.push(generator.initializer(&self.identity, ""));
        }
        signature::verify_uniform(&entries, generator.registry())?;

        let source = self.render_source(header, generator.registry().version(), &entries);
        tracing::info!(shader = %self.identity, entries = entries.len(), "generated unit");
        Ok(GeneratedUnit {
            identity: self.identity.clone(),
            entries,
            source,
        })
    }

    fn render_source(&self, header: &str, version: u32, entries: &[EntryPoint]) -> String {
        let identity = &self.identity;
        let mut out = format!(
            "// Generated by stagegen for shader '{identity}'. Do not edit.\n#include \"{header}\"\n\n"
        );
        out.push_str(&format!(
            "#if STAGEGEN_REGISTRY_VERSION != {version}\n#error \"{identity} was generated against binding registry version {version}\"\n#endif\n\n"
        ));
        out.push_str(&format!(
            "typedef {} ComputeBuffer;\ntypedef {} VertexOut;\n\n",
            self.manifest.compute_element,
            self.manifest.vertex_output.type_name()
        ));
        if let Some(shape) = fragment_output(entries) {
            out.push_str(&format!("typedef {} FragmentOutput;\n\n", shape.type_name()));
        }
        match &self.prelude {
            Some(prelude) => {
                out.push_str(prelude.trim_end());
                out.push_str("\n\n");
            }
            None => out.push_str("struct KBuffer {\n  int reserved;\n};\n\n"),
        }
        let rendered: Vec<String> = entries.iter().map(EntryPoint::render).collect();
        out.push_str(&rendered.join("\n"));
        out
    }
}

/// The shape `FragmentOutput` names: the first fragment stage's, or the first
/// filter's when the unit has no fragment stage.
fn fragment_output(entries: &[EntryPoint]) -> Option<OutputShape> {
    let first = |tag: &str| {
        entries
            .iter()
            .find(|entry| entry.stage.tag() == tag)
            .and_then(|entry| entry.stage.output())
    };
    first("fragment").or_else(|| first("filter"))
}

fn read_source(root: &Path, relative: &Path) -> Result<String, UnitError> {
    let path = root.join(relative);
    if !path.exists() {
        return Err(UnitError::SourceMissing(path));
    }
    Ok(fs::read_to_string(path)?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub identity: ShaderIdentity,
    pub entries: Vec<EntryPoint>,
    pub source: String,
}

impl GeneratedUnit {
    pub fn file_name(&self) -> String {
        format!("{}.metal", self.identity)
    }

    pub fn initializer(&self) -> Option<&EntryPoint> {
        self.entries
            .iter()
            .find(|entry| entry.stage == Stage::Initialize)
    }
}

#[cfg(test)]
mod tests {
    use shaderabi::CANONICAL;
    use tempfile::TempDir;

    use super::*;
    use crate::prelude::DEFAULT_HEADER;

    fn write_unit(dir: &Path, manifest: &str, files: &[(&str, &str)]) {
        fs::write(dir.join(MANIFEST_FILE), manifest).expect("write manifest");
        for (path, contents) in files {
            fs::write(dir.join(path), contents).expect("write file");
        }
    }

    const PLASMA: &str = r#"
identity = "plasma"
prelude = "common.metal"

[[stages]]
kind = "vertex"
body = "VertexOut out;\nreturn out;"

[[stages]]
kind = "fragment"
targets = 2
source = "plasma.frag.metal"
"#;

    fn plasma_dir() -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        write_unit(
            dir.path(),
            PLASMA,
            &[
                ("common.metal", "struct KBuffer {\n  string textures[4];\n};\n"),
                (
                    "plasma.frag.metal",
                    "FragmentOutput2 out;\nout.fragColor = float4(1);\nreturn out;\n",
                ),
            ],
        );
        dir
    }

    #[test]
    fn loads_and_renders_a_unit() {
        let dir = plasma_dir();
        let unit = ShaderUnit::load(dir.path(), LoadOptions::default()).unwrap();
        let generated = unit
            .generate(&Generator::new(&CANONICAL), DEFAULT_HEADER)
            .unwrap();

        let names: Vec<&str> = generated.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "plasma___Vertex",
                "plasma___Fragment2",
                "plasma___InitializeOptions"
            ]
        );
        assert_eq!(generated.file_name(), "plasma.metal");
        assert!(generated.source.contains("#include \"stagegen_common.h\""));
        assert!(generated.source.contains("typedef float4 ComputeBuffer;"));
        assert!(generated.source.contains("typedef VertexOutTriangle VertexOut;"));
        assert!(generated.source.contains("string textures[4];"));
        assert!(generated.source.contains("fragment FragmentOutput2 plasma___Fragment2("));
        assert!(generated.source.contains("typedef FragmentOutput2 FragmentOutput;\n"));
        assert_eq!(
            generated.initializer().map(|e| e.name.as_str()),
            Some("plasma___InitializeOptions")
        );
    }

    #[test]
    fn fragment_output_alias_follows_the_unit_stages() {
        let dir = TempDir::new().expect("tempdir");
        let generator = Generator::new(&CANONICAL);
        let render = |manifest: &str| {
            write_unit(dir.path(), manifest, &[]);
            ShaderUnit::load(dir.path(), LoadOptions::default())
                .unwrap()
                .generate(&generator, DEFAULT_HEADER)
                .unwrap()
                .source
        };

        let filtered = render(
            "identity = \"blur\"\n[[stages]]\nkind = \"filter\"\ntargets = 3\nbody = \"\"\n",
        );
        assert!(filtered.contains("typedef FragmentOutput3 FragmentOutput;\n"));

        let both = render(
            "identity = \"blur\"\n[[stages]]\nkind = \"filter\"\ntargets = 3\nbody = \"\"\n\n[[stages]]\nkind = \"fragment\"\ntargets = 0\nbody = \"\"\n",
        );
        assert!(both.contains("typedef FragmentOutput0 FragmentOutput;\n"));
        assert_eq!(both.matches("FragmentOutput;").count(), 1);

        let compute_only = render(
            "identity = \"blur\"\n[[stages]]\nkind = \"compute\"\nbody = \"\"\n",
        );
        assert!(!compute_only.contains("FragmentOutput"));
    }

    #[test]
    fn regeneration_is_byte_identical() {
        let dir = plasma_dir();
        let generator = Generator::new(&CANONICAL);
        let first = ShaderUnit::load(dir.path(), LoadOptions::default())
            .unwrap()
            .generate(&generator, DEFAULT_HEADER)
            .unwrap();
        let second = ShaderUnit::load(dir.path(), LoadOptions::default())
            .unwrap()
            .generate(&generator, DEFAULT_HEADER)
            .unwrap();
        assert_eq!(first.source, second.source);
    }

    #[test]
    fn missing_identity_fails_unless_derivation_requested() {
        let dir = TempDir::new().expect("tempdir");
        let unit_dir = dir.path().join("warp-speed");
        fs::create_dir(&unit_dir).unwrap();
        write_unit(&unit_dir, "[[stages]]\nkind = \"compute\"\nbody = \"\"\n", &[]);

        let err = ShaderUnit::load(&unit_dir, LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            UnitError::Generate(GenerateError::MissingIdentity { .. })
        ));

        let unit = ShaderUnit::load(
            &unit_dir,
            LoadOptions {
                derive_identity: true,
            },
        )
        .unwrap();
        assert_eq!(unit.identity().as_str(), "warp_speed");
    }

    #[test]
    fn reports_missing_manifest_and_sources() {
        let dir = TempDir::new().expect("tempdir");
        assert!(matches!(
            ShaderUnit::load(dir.path(), LoadOptions::default()),
            Err(UnitError::ManifestMissing(_))
        ));

        write_unit(
            dir.path(),
            "identity = \"wave\"\n[[stages]]\nkind = \"compute\"\nsource = \"gone.metal\"\n",
            &[],
        );
        assert!(matches!(
            ShaderUnit::load(dir.path(), LoadOptions::default()),
            Err(UnitError::SourceMissing(_))
        ));
    }

    #[test]
    fn invalid_manifest_lists_issues() {
        let dir = TempDir::new().expect("tempdir");
        write_unit(
            dir.path(),
            "identity = \"wave\"\n[[stages]]\nkind = \"fragment\"\ntargets = 5\nbody = \"\"\n",
            &[],
        );
        match ShaderUnit::load(dir.path(), LoadOptions::default()) {
            Err(UnitError::ManifestValidation(issues)) => assert_eq!(issues.len(), 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
