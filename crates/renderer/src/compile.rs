use std::collections::{HashMap, HashSet};

use wgpu::naga;

use crate::error::{RenderError, StageKind};

/// Names the host injects into every fragment shader. User declarations of
/// these are stripped before wrapping so our own definitions win.
const HOST_UNIFORMS: [&str; 4] = ["iResolution", "iTime", "iChannel0", "iChannel1"];

/// A stage that passed the device compiler. Holds the exact GLSL handed to
/// `wgpu` plus the parsed module used for interface checks and reflection.
pub struct CompiledStage {
    pub stage: StageKind,
    pub source: String,
    pub module: naga::Module,
}

/// Where a named uniform lives once the program is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformBinding {
    /// Byte offset of a member inside the std140 frame-parameter block.
    BlockMember { offset: u32 },
    /// Texture unit index backing a sampler-style uniform.
    TextureUnit { unit: u32 },
}

/// Name-to-handle map produced by reflecting a linked program.
///
/// Lookups are plain map reads: resolving the same name twice always yields
/// the same handle, and a name the shader never declared resolves to `None`.
/// Callers treat `None` as "skip the write", never as an error.
#[derive(Debug, Default)]
pub struct UniformTable {
    entries: HashMap<String, UniformBinding>,
}

impl UniformTable {
    pub fn resolve(&self, name: &str) -> Option<UniformBinding> {
        self.entries.get(name).copied()
    }
}

/// Vertex attribute name-to-location map, same tolerance as [`UniformTable`].
#[derive(Debug, Default)]
pub struct AttributeTable {
    entries: HashMap<String, u32>,
}

impl AttributeTable {
    pub fn resolve(&self, name: &str) -> Option<u32> {
        self.entries.get(name).copied()
    }
}

/// A vertex/fragment pair whose varying interfaces were checked against each
/// other. Only a value of this type can be turned into a render pipeline, so
/// a draw can never see a half-compiled program.
pub struct LinkedProgram {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
    uniforms: UniformTable,
    attributes: AttributeTable,
}

impl LinkedProgram {
    pub fn resolve_uniform(&self, name: &str) -> Option<UniformBinding> {
        self.uniforms.resolve(name)
    }

    pub fn resolve_attribute(&self, name: &str) -> Option<u32> {
        self.attributes.resolve(name)
    }
}

/// Runs one stage through the naga GLSL front-end and validator.
///
/// This is the same front-end `wgpu` invokes when the module is created for
/// the device, so a stage that passes here is known-good before any GPU
/// object exists. Failures carry the full diagnostic rendered against the
/// wrapped source.
pub fn compile_stage(stage: StageKind, source: &str) -> Result<CompiledStage, RenderError> {
    let naga_stage = match stage {
        StageKind::Vertex => naga::ShaderStage::Vertex,
        StageKind::Fragment => naga::ShaderStage::Fragment,
    };

    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(naga_stage);
    let module = frontend.parse(&options, source).map_err(|errors| RenderError::Compile {
        stage,
        log: errors.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator.validate(&module).map_err(|error| RenderError::Compile {
        stage,
        log: error.emit_to_string(source),
    })?;

    if !module
        .entry_points
        .iter()
        .any(|entry| entry.stage == naga_stage && entry.name == "main")
    {
        return Err(RenderError::Compile {
            stage,
            log: format!("no `main` entry point found in the {stage} stage"),
        });
    }

    Ok(CompiledStage {
        stage,
        source: source.to_string(),
        module,
    })
}

/// Compiles the fixed pass-through vertex stage.
pub fn compile_vertex_stage() -> Result<CompiledStage, RenderError> {
    compile_stage(StageKind::Vertex, VERTEX_SHADER_GLSL)
}

/// Wraps and compiles the externally supplied fragment source.
pub fn compile_fragment_stage(source: &str) -> Result<CompiledStage, RenderError> {
    let wrapped = wrap_fragment_source(source);
    compile_stage(StageKind::Fragment, &wrapped)
}

/// Joins two compiled stages into a program.
///
/// Linking checks that every varying the fragment stage consumes is produced
/// by the vertex stage, then reflects the uniform block, sampler bindings,
/// and vertex attributes into name tables. Compilation and linking stay
/// separate failure points so a broken interface is reported as such rather
/// than as a stage error.
pub fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<LinkedProgram, RenderError> {
    if vertex.stage != StageKind::Vertex || fragment.stage != StageKind::Fragment {
        return Err(RenderError::Link {
            log: format!(
                "expected a vertex/fragment pair, got {} and {}",
                vertex.stage, fragment.stage
            ),
        });
    }

    let produced = output_locations(&vertex.module, naga::ShaderStage::Vertex);
    let consumed = input_locations(&fragment.module, naga::ShaderStage::Fragment);

    let missing: Vec<u32> = consumed.difference(&produced).copied().collect();
    if !missing.is_empty() {
        let mut missing = missing;
        missing.sort_unstable();
        let listed = missing
            .iter()
            .map(|location| format!("location {location}"))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(RenderError::Link {
            log: format!("fragment stage reads varyings the vertex stage does not write: {listed}"),
        });
    }

    let uniforms = reflect_uniforms(&fragment.module);
    let attributes = reflect_attributes(&vertex.module, naga::ShaderStage::Vertex);

    Ok(LinkedProgram {
        vertex,
        fragment,
        uniforms,
        attributes,
    })
}

/// Collects the output locations an entry point writes.
fn output_locations(module: &naga::Module, stage: naga::ShaderStage) -> HashSet<u32> {
    let mut locations = HashSet::new();
    let Some(entry) = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == stage && entry.name == "main")
    else {
        return locations;
    };
    let Some(result) = &entry.function.result else {
        return locations;
    };
    match &result.binding {
        Some(naga::Binding::Location { location, .. }) => {
            locations.insert(*location);
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[result.ty].inner {
                for member in members {
                    if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                        locations.insert(*location);
                    }
                }
            }
        }
    }
    locations
}

/// Collects the input locations an entry point reads.
fn input_locations(module: &naga::Module, stage: naga::ShaderStage) -> HashSet<u32> {
    let mut locations = HashSet::new();
    let Some(entry) = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == stage && entry.name == "main")
    else {
        return locations;
    };
    for argument in &entry.function.arguments {
        match &argument.binding {
            Some(naga::Binding::Location { location, .. }) => {
                locations.insert(*location);
            }
            Some(naga::Binding::BuiltIn(_)) => {}
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[argument.ty].inner {
                    for member in members {
                        if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                            locations.insert(*location);
                        }
                    }
                }
            }
        }
    }
    locations
}

/// Builds the uniform name table from the fragment module.
///
/// Block members are declared with a leading underscore in [`FRAGMENT_HEADER`]
/// (macro aliases map the public names onto them), so the underscore is
/// stripped here to recover the names callers resolve by. Texture globals
/// sit in bind group 1 at `unit * 2`, mirroring the header's layout.
fn reflect_uniforms(module: &naga::Module) -> UniformTable {
    let mut entries = HashMap::new();
    for (_, variable) in module.global_variables.iter() {
        match variable.space {
            naga::AddressSpace::Uniform => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[variable.ty].inner {
                    for member in members {
                        if let Some(name) = &member.name {
                            let public = name.strip_prefix('_').unwrap_or(name);
                            entries.insert(
                                public.to_string(),
                                UniformBinding::BlockMember {
                                    offset: member.offset,
                                },
                            );
                        }
                    }
                }
            }
            naga::AddressSpace::Handle => {
                if let naga::TypeInner::Image { .. } = module.types[variable.ty].inner {
                    if let Some(binding) = &variable.binding {
                        let unit = binding.binding / 2;
                        entries.insert(
                            format!("iChannel{unit}"),
                            UniformBinding::TextureUnit { unit },
                        );
                    }
                }
            }
            _ => {}
        }
    }
    UniformTable { entries }
}

/// Builds the attribute name table from the vertex entry point arguments.
fn reflect_attributes(module: &naga::Module, stage: naga::ShaderStage) -> AttributeTable {
    let mut entries = HashMap::new();
    if let Some(entry) = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == stage && entry.name == "main")
    {
        for argument in &entry.function.arguments {
            if let (Some(name), Some(naga::Binding::Location { location, .. })) =
                (&argument.name, &argument.binding)
            {
                entries.insert(name.clone(), *location);
            }
        }
    }
    AttributeTable { entries }
}

/// Produces a self-contained Vulkan-GLSL fragment shader from user source.
///
/// Steps performed:
///
/// 1. Strip `#version` and `precision` directives plus any declaration of a
///    host-owned uniform so our own definitions can be injected.
/// 2. Prepend [`FRAGMENT_HEADER`], which declares the frame-parameter block,
///    the channel texture/sampler bindings, the output variable, and macro
///    aliases for the public uniform names and `gl_FragColor`.
/// 3. Emit `#line 1` so compiler diagnostics point into the user's source.
///
/// The user's own `void main()` stays the entry point.
pub fn wrap_fragment_source(source: &str) -> String {
    let mut sanitized = String::new();
    let mut skipped_version = false;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if !skipped_version && trimmed.starts_with("#version") {
            skipped_version = true;
            continue;
        }
        if trimmed.starts_with("precision ") {
            continue;
        }
        let is_host_uniform = trimmed.starts_with("uniform ")
            && HOST_UNIFORMS.iter().any(|name| trimmed.contains(name));
        if is_host_uniform {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }

    format!("{FRAGMENT_HEADER}\n#line 1\n{sanitized}")
}

/// GLSL prologue injected ahead of every user fragment shader.
///
/// The uniform block layout must match [`FrameUniforms`] in
/// `gpu/uniforms.rs`. Members carry a leading underscore so the macro
/// aliases for the public names cannot collide with them.
///
/// [`FrameUniforms`]: crate::gpu::uniforms::FrameUniforms
const FRAGMENT_HEADER: &str = r"#version 450
layout(location = 0) out vec4 fragview_out_color;
#define gl_FragColor fragview_out_color

layout(std140, set = 0, binding = 0) uniform FrameParams {
    vec2 _iResolution;
    float _iTime;
} params;

#define iResolution params._iResolution
#define iTime params._iTime

layout(set = 1, binding = 0) uniform texture2D fragview_channel0_texture;
layout(set = 1, binding = 1) uniform sampler fragview_channel0_sampler;
layout(set = 1, binding = 2) uniform texture2D fragview_channel1_texture;
layout(set = 1, binding = 3) uniform sampler fragview_channel1_sampler;

#define iChannel0 sampler2D(fragview_channel0_texture, fragview_channel0_sampler)
#define iChannel1 sampler2D(fragview_channel1_texture, fragview_channel1_sampler)
";

/// Fixed pass-through vertex shader: forwards the quad corner to clip space.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 aVertexPosition;

void main() {
    gl_Position = vec4(aVertexPosition, 0.0, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    fn linked(fragment: &str) -> LinkedProgram {
        let vertex = compile_vertex_stage().expect("vertex stage compiles");
        let fragment = compile_fragment_stage(fragment).expect("fragment stage compiles");
        link(vertex, fragment).expect("program links")
    }

    #[test]
    fn wrap_strips_version_and_host_uniforms() {
        let source = r#"
            #version 100
            precision mediump float;
            uniform vec2 iResolution;
            uniform float iTime;
            void main() {
                gl_FragColor = vec4(iTime, iResolution, 1.0);
            }
        "#;

        let wrapped = wrap_fragment_source(source);
        assert!(!wrapped.contains("#version 100"));
        assert!(!wrapped.contains("precision mediump"));
        assert!(!wrapped.contains("uniform vec2 iResolution"));
        assert!(!wrapped.contains("uniform float iTime"));
        assert!(wrapped.contains("#line 1"));
        assert!(wrapped.contains("gl_FragColor = vec4(iTime, iResolution, 1.0);"));
    }

    #[test]
    fn minimal_webgl_style_fragment_compiles_and_links() {
        let program = linked("void main() { gl_FragColor = vec4(1.0); }");
        assert!(program.resolve_uniform("iResolution").is_some());
        assert!(program.resolve_uniform("iTime").is_some());
    }

    #[test]
    fn compile_failure_names_the_fragment_stage_and_carries_a_log() {
        let error = compile_fragment_stage("void main() { gl_FragColor = banana; }")
            .err()
            .expect("broken shader must not compile");
        match error {
            RenderError::Compile { stage, log } => {
                assert_eq!(stage, StageKind::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("expected a compile error, got {other:?}"),
        }
    }

    #[test]
    fn uniform_resolution_is_idempotent() {
        let program = linked("void main() { gl_FragColor = vec4(iTime); }");
        let first = program.resolve_uniform("iTime");
        let second = program.resolve_uniform("iTime");
        assert_eq!(first, second);
        assert_eq!(
            program.resolve_attribute("aVertexPosition"),
            program.resolve_attribute("aVertexPosition")
        );
    }

    #[test]
    fn undeclared_uniform_resolves_to_none() {
        let program = linked("void main() { gl_FragColor = vec4(1.0); }");
        assert_eq!(program.resolve_uniform("iFoo"), None);
        assert_eq!(program.resolve_attribute("aMissing"), None);
    }

    #[test]
    fn block_member_offsets_follow_std140() {
        let program = linked("void main() { gl_FragColor = vec4(1.0); }");
        assert_eq!(
            program.resolve_uniform("iResolution"),
            Some(UniformBinding::BlockMember { offset: 0 })
        );
        assert_eq!(
            program.resolve_uniform("iTime"),
            Some(UniformBinding::BlockMember { offset: 8 })
        );
    }

    #[test]
    fn channels_map_to_their_texture_units() {
        let program = linked("void main() { gl_FragColor = vec4(1.0); }");
        assert_eq!(
            program.resolve_uniform("iChannel0"),
            Some(UniformBinding::TextureUnit { unit: 0 })
        );
        assert_eq!(
            program.resolve_uniform("iChannel1"),
            Some(UniformBinding::TextureUnit { unit: 1 })
        );
    }

    #[test]
    fn vertex_attribute_sits_at_location_zero() {
        let program = linked("void main() { gl_FragColor = vec4(1.0); }");
        assert_eq!(program.resolve_attribute("aVertexPosition"), Some(0));
    }

    #[test]
    fn unmatched_varying_fails_to_link() {
        let vertex = compile_vertex_stage().expect("vertex stage compiles");
        let fragment = compile_fragment_stage(
            "layout(location = 0) in vec2 vUv;\nvoid main() { gl_FragColor = vec4(vUv, 0.0, 1.0); }",
        )
        .expect("fragment stage compiles on its own");
        match link(vertex, fragment) {
            Err(RenderError::Link { log }) => assert!(log.contains("location 0")),
            other => panic!("expected a link error, got {:?}", other.err()),
        }
    }
}
