/// WGSL shader for the floor plane and model meshes: hemisphere ambient,
/// spot light with cone/range falloff, linear fog.
pub const SCENE_SHADER: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    fog_color: vec4<f32>,
    fog_params: vec4<f32>,      // near, far
    spot_position: vec4<f32>,
    spot_direction: vec4<f32>,
    spot_color: vec4<f32>,      // rgb, intensity
    spot_params: vec4<f32>,     // cos_outer, cos_inner, decay, range
    hemi_sky: vec4<f32>,        // rgb, intensity
    hemi_ground: vec4<f32>,
};

struct PrimitiveUniforms {
    model: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(1) @binding(0)
var<uniform> prim: PrimitiveUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = prim.model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (prim.model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = world_normal;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);

    // Hemisphere fill: sky color from above, ground color from below.
    let hemi_mix = n.y * 0.5 + 0.5;
    let hemi = mix(frame.hemi_ground.rgb, frame.hemi_sky.rgb, hemi_mix) * frame.hemi_sky.w;

    // Spot light.
    let to_light = frame.spot_position.xyz - in.world_pos;
    let dist = length(to_light);
    let l = to_light / max(dist, 1e-4);
    let cone_cos = dot(-l, normalize(frame.spot_direction.xyz));
    let cone = smoothstep(frame.spot_params.x, frame.spot_params.y, cone_cos);
    let range = max(frame.spot_params.w, 1e-3);
    let range_fade = clamp(1.0 - pow(dist / range, 4.0), 0.0, 1.0);
    let atten = range_fade / pow(max(dist, 1e-3), frame.spot_params.z);
    let diffuse = max(dot(n, l), 0.0);
    let spot = frame.spot_color.rgb * frame.spot_color.w * diffuse * cone * atten;

    var color = prim.color.rgb * (hemi + spot);

    // Linear fog over view distance.
    let view_dist = length(frame.camera_pos.xyz - in.world_pos);
    let denom = max(frame.fog_params.y - frame.fog_params.x, 1e-4);
    let fog_t = clamp((view_dist - frame.fog_params.x) / denom, 0.0, 1.0);
    color = mix(color, frame.fog_color.rgb, fog_t);

    return vec4<f32>(color, prim.color.a);
}
"#;
