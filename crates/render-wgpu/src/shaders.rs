/// Textured, tinted geometry: the floor plane, cubes and the sphere.
///
/// Group 0 holds the camera, group 1 the material. The fragment colour is
/// `mix(texture_a, texture_b, mix_factor * texture_b.a) * vertex colour * tint`.
pub const SCENE_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

struct Material {
    tint: vec4<f32>,
    mix_factor: f32,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var<uniform> material: Material;
@group(1) @binding(1)
var texture_a: texture_2d<f32>;
@group(1) @binding(2)
var sampler_a: sampler;
@group(1) @binding(3)
var texture_b: texture_2d<f32>;
@group(1) @binding(4)
var sampler_b: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );

    var out: VertexOutput;
    out.clip_position = camera.view_proj * model * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let a = textureSample(texture_a, sampler_a, in.uv);
    let b = textureSample(texture_b, sampler_b, in.uv);
    let base = mix(a, b, material.mix_factor * b.a);
    return vec4<f32>(base.rgb * in.color, 1.0) * material.tint;
}
"#;

/// Environment cube. Depth is forced to the far plane so the sky sits
/// behind everything drawn before it.
pub const SKYBOX_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;
@group(0) @binding(1)
var sky_texture: texture_cube<f32>;
@group(0) @binding(2)
var sky_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_sky(@location(0) position: vec3<f32>) -> VertexOutput {
    let clip = camera.view_proj * vec4<f32>(position, 1.0);

    var out: VertexOutput;
    out.clip_position = clip.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_sky(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(sky_texture, sky_sampler, in.direction);
}
"#;
