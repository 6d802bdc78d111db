use std::borrow::Cow;

use wgpu::naga::ShaderStage;

use crate::error::RendererError;
use crate::gpu::diagnostics;

/// Compiles a GLSL asset, turning front-end errors into [`RendererError`].
pub(crate) fn compile_glsl(
    device: &wgpu::Device,
    name: &str,
    source: &str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule, RendererError> {
    let normalized = normalize_glsl(source);
    let (module, error) = diagnostics::validated(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Glsl {
                shader: Cow::Owned(normalized.into_owned()),
                stage,
                defines: &[],
            },
        })
    });
    match error {
        None => Ok(module),
        Some(error) => Err(RendererError::ShaderCompile {
            name: name.to_string(),
            stage: stage_name(stage),
            message: error.to_string(),
        }),
    }
}

fn stage_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vertex",
        ShaderStage::Fragment => "fragment",
        _ => "compute",
    }
}

/// Lets GLSL ES 3.x sources through the desktop front end.
///
/// `#version 3x0 es` becomes `#version 450` and default `precision`
/// statements are dropped. Desktop sources are returned untouched.
pub(crate) fn normalize_glsl(source: &str) -> Cow<'_, str> {
    let is_es = source
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with("#version") && line.ends_with(" es"));
    if !is_es {
        return Cow::Borrowed(source);
    }

    let mut out = String::with_capacity(source.len());
    let mut replaced_version = false;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if !replaced_version && trimmed.starts_with("#version") {
            out.push_str("#version 450\n");
            replaced_version = true;
            continue;
        }
        if trimmed.starts_with("precision ") {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    Cow::Owned(out)
}

/// Full-screen triangle used to present the render target.
///
/// `v_uv.y` is 1 at the top of the window, which addresses the last row of
/// the bottom-up render target.
pub(crate) const PRESENT_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Scales the render target onto the window surface.
pub(crate) const PRESENT_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 0, binding = 0) uniform texture2D frameTexture;
layout(set = 0, binding = 1) uniform sampler frameSampler;

void main() {
    outColor = vec4(texture(sampler2D(frameTexture, frameSampler), v_uv).rgb, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn es_sources_are_rewritten_for_the_desktop_front_end() {
        let source = "\n#version 300 es\nprecision highp float;\nin vec2 v;\nvoid main() {}\n";
        let normalized = normalize_glsl(source);
        assert!(normalized.starts_with("\n#version 450\n"));
        assert!(!normalized.contains("precision"));
        assert!(normalized.contains("void main() {}"));
    }

    #[test]
    fn desktop_sources_are_borrowed() {
        assert!(matches!(
            normalize_glsl(PRESENT_FRAGMENT_GLSL),
            Cow::Borrowed(_)
        ));
    }
}
