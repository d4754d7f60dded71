use std::borrow::Cow;

use anyhow::Result;
use wgpu::naga::ShaderStage;

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    }))
}

/// Compiles one of the built-in fragment programs.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    label: &'static str,
    source: &'static str,
) -> Result<wgpu::ShaderModule> {
    tracing::debug!(label, bytes = source.len(), "compiling fragment shader");
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    }))
}

/// Minimal full-screen triangle vertex shader.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

void main() {
    vec2 positions[3] = vec2[3](
        vec2(-1.0, -3.0),
        vec2(3.0, 1.0),
        vec2(-1.0, 1.0)
    );
    vec2 pos = positions[gl_VertexIndex];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Noir smoke: domain-warped simplex fbm, film grain and a pointer glow.
///
/// The uniform block layout must match [`crate::gpu::SmokeUniforms`]. The
/// builtin `gl_FragCoord` has a top-left origin here, so it is flipped and
/// scaled into render-resolution space before shading.
pub const SMOKE_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform SmokeParams {
    vec2 uResolution;
    vec2 uMouse;
    vec2 uFragScale;
    vec2 uSurface;
    float uTime;
    float uPad0;
    float uPad1;
    float uPad2;
} params;

const vec4 SIMPLEX_C = vec4(0.211324865405187, 0.366025403784439,
                            -0.577350269189626, 0.024390243902439);

vec3 permute(vec3 x) {
    return mod(((x * 34.0) + vec3(1.0)) * x, vec3(289.0));
}

float snoise(vec2 v) {
    vec2 i = floor(v + vec2(dot(v, SIMPLEX_C.yy)));
    vec2 x0 = v - i + vec2(dot(i, SIMPLEX_C.xx));
    vec2 i1 = vec2(0.0, 1.0);
    if (x0.x > x0.y) {
        i1 = vec2(1.0, 0.0);
    }
    vec4 x12 = x0.xyxy + SIMPLEX_C.xxzz;
    x12 = vec4(x12.x - i1.x, x12.y - i1.y, x12.z, x12.w);
    i = mod(i, vec2(289.0));
    vec3 p = permute(permute(vec3(i.y) + vec3(0.0, i1.y, 1.0))
        + vec3(i.x) + vec3(0.0, i1.x, 1.0));
    vec3 m = max(vec3(0.5) - vec3(dot(x0, x0), dot(x12.xy, x12.xy), dot(x12.zw, x12.zw)), vec3(0.0));
    m = m * m;
    m = m * m;
    vec3 x = 2.0 * fract(p * SIMPLEX_C.www) - vec3(1.0);
    vec3 h = abs(x) - vec3(0.5);
    vec3 ox = floor(x + vec3(0.5));
    vec3 a0 = x - ox;
    m = m * (vec3(1.79284291400159) - 0.85373472095314 * (a0 * a0 + h * h));
    vec3 g = vec3(a0.x * x0.x + h.x * x0.y,
                  a0.y * x12.x + h.y * x12.y,
                  a0.z * x12.z + h.z * x12.w);
    return 130.0 * dot(m, g);
}

float fbm(vec2 p) {
    float value = 0.0;
    float amplitude = 0.5;
    for (int octave = 0; octave < 3; octave++) {
        value += amplitude * snoise(p);
        p = p * 2.0;
        amplitude *= 0.5;
    }
    return value;
}

float random(vec2 st) {
    return fract(sin(dot(st, vec2(12.9898, 78.233))) * 43758.5453123);
}

vec3 noir(vec2 fragCoord, vec2 resolution, vec2 pointer, float time) {
    float aspect = resolution.x / resolution.y;
    vec2 st = vec2(fragCoord.x / resolution.x * aspect, fragCoord.y / resolution.y);

    vec2 mouse = pointer * aspect;
    float mouseDist = distance(st, mouse);

    vec2 q = vec2(fbm(st + vec2(0.1 * time)), fbm(st + vec2(1.0)));
    vec2 r = vec2(fbm(st + q + vec2(1.7, 9.2) + vec2(0.15 * time)),
                  fbm(st + q + vec2(8.3, 2.8) + vec2(0.126 * time)));
    float f = fbm(st + r);

    vec3 colorBlack = vec3(0.02, 0.02, 0.02);
    vec3 colorGrey = vec3(0.15, 0.15, 0.16);
    vec3 colorHighlight = vec3(0.1, 0.1, 0.12);

    vec3 color = mix(colorBlack, colorGrey, clamp((f * f) * 4.0, 0.0, 1.0));
    color = mix(color, colorHighlight, clamp(length(q), 0.0, 1.0));
    color = color + vec3(r.y * 0.05);

    float grain = random(st * time);
    color = color + vec3((grain - 0.5) * 0.08);

    float interaction = 1.0 - smoothstep(0.0, 0.5, mouseDist);
    color = color + vec3(0.05) * interaction;
    return color;
}

void main() {
    vec2 resolution = params.uResolution;
    if (resolution.x <= 0.0 || resolution.y <= 0.0) {
        outColor = vec4(0.0, 0.0, 0.0, 1.0);
        return;
    }
    vec2 fragCoord = vec2(gl_FragCoord.x, params.uSurface.y - gl_FragCoord.y) * params.uFragScale;
    outColor = vec4(noir(fragCoord, resolution, params.uMouse, params.uTime), 1.0);
}
";

/// Loader bar and reveal panels, composited over the smoke.
///
/// Output is premultiplied; the block layout must match
/// [`crate::gpu::OverlayUniforms`].
pub const OVERLAY_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform OverlayParams {
    vec4 uLoader;
    vec4 uViewport;
    vec4 uMeta;
    vec4 uPanelRect[8];
    vec4 uPanelColor[8];
    vec4 uPanelState[8];
} overlay;

vec4 over(vec4 dst, vec3 rgb, float alpha) {
    return vec4(rgb * alpha + dst.rgb * (1.0 - alpha), alpha + dst.a * (1.0 - alpha));
}

float inside(vec2 uv, vec4 rect) {
    vec2 lo = step(rect.xy, uv);
    vec2 hi = step(uv, rect.xy + rect.zw);
    return lo.x * lo.y * hi.x * hi.y;
}

void main() {
    vec2 uv = gl_FragCoord.xy / max(overlay.uViewport.xy, vec2(1.0));
    vec4 color = vec4(0.0);

    int panelCount = int(overlay.uMeta.x);
    for (int index = 0; index < 8; index++) {
        if (index >= panelCount) {
            break;
        }
        vec4 rect = overlay.uPanelRect[index];
        vec4 state = overlay.uPanelState[index];
        rect = vec4(rect.x, rect.y + state.y, rect.z, rect.w);
        float coverage = inside(uv, rect);
        if (coverage > 0.0) {
            vec4 tint = overlay.uPanelColor[index];
            vec3 rgb = min(tint.rgb + vec3(state.z), vec3(1.0));
            color = over(color, rgb, tint.a * state.x);
        }
    }

    if (overlay.uLoader.z > 0.5) {
        float fade = overlay.uLoader.y;
        color = over(color, vec3(0.02, 0.02, 0.02), fade);

        float barHalfWidth = overlay.uMeta.y * 0.5;
        float barHalfHeight = overlay.uMeta.z * 0.5;
        float barLeft = 0.5 - barHalfWidth;
        vec4 bar = vec4(barLeft, 0.5 - barHalfHeight, barHalfWidth * 2.0 * overlay.uLoader.x, barHalfHeight * 2.0);
        float lit = inside(uv, bar);
        vec4 track = vec4(barLeft, 0.5 - barHalfHeight, barHalfWidth * 2.0, barHalfHeight * 2.0);
        float rail = inside(uv, track);
        color = over(color, vec3(0.2, 0.2, 0.22), rail * fade * 0.6);
        color = over(color, vec3(0.9, 0.9, 0.92), lit * fade);
    }

    outColor = color;
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::naga;

    fn validate(source: &str, stage: ShaderStage) {
        let mut frontend = naga::front::glsl::Frontend::default();
        let module = frontend
            .parse(&naga::front::glsl::Options::from(stage), source)
            .unwrap_or_else(|err| panic!("GLSL parse failed: {err:?}"));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|err| panic!("GLSL validation failed: {err:?}"));
    }

    #[test]
    fn vertex_shader_validates() {
        validate(VERTEX_SHADER_GLSL, ShaderStage::Vertex);
    }

    #[test]
    fn smoke_shader_validates() {
        validate(SMOKE_FRAGMENT_GLSL, ShaderStage::Fragment);
    }

    #[test]
    fn overlay_shader_validates() {
        validate(OVERLAY_FRAGMENT_GLSL, ShaderStage::Fragment);
    }

    #[test]
    fn smoke_shader_declares_landing_uniforms() {
        for name in ["uTime", "uResolution", "uMouse"] {
            assert!(SMOKE_FRAGMENT_GLSL.contains(name), "missing {name}");
        }
        assert!(SMOKE_FRAGMENT_GLSL.contains("43758.5453123"));
        assert!(SMOKE_FRAGMENT_GLSL.contains("smoothstep(0.0, 0.5, mouseDist)"));
    }
}
