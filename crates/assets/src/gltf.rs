use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;

// glTF component types (accessor.componentType).
const COMPONENT_U8: u64 = 5121;
const COMPONENT_U16: u64 = 5123;
const COMPONENT_U32: u64 = 5125;
const COMPONENT_F32: u64 = 5126;

const DEFAULT_BASE_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed glTF: {0}")]
    Malformed(String),
    #[error("unsupported glTF feature: {0}")]
    Unsupported(String),
}

/// One renderable triangle mesh decoded from a glTF primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Short content digest of the raw asset bytes, for provenance logging.
pub fn content_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse a glTF 2.0 document into renderable meshes.
///
/// External `.bin` buffers are resolved relative to the document. Sparse
/// accessors, data-URI buffers, and non-triangle primitives are rejected
/// rather than silently skipped.
pub fn load_gltf(path: impl AsRef<Path>) -> Result<Vec<MeshData>, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    tracing::debug!(
        path = %path.display(),
        digest = %content_digest(&bytes),
        "parsing glTF document"
    );

    let doc: Value = serde_json::from_slice(&bytes)?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let buffers = load_buffers(&doc, base_dir)?;
    let base_colors = material_base_colors(&doc);

    let empty = Vec::new();
    let meshes = doc
        .get("meshes")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut out = Vec::new();
    for (mesh_index, mesh) in meshes.iter().enumerate() {
        let mesh_name = mesh
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{mesh_index}"));

        let primitives = mesh
            .get("primitives")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AssetError::Malformed(format!("mesh {mesh_index} has no primitives"))
            })?;

        for (prim_index, prim) in primitives.iter().enumerate() {
            let name = if primitives.len() > 1 {
                format!("{mesh_name}_{prim_index}")
            } else {
                mesh_name.clone()
            };
            out.push(decode_primitive(&doc, &buffers, &base_colors, prim, &name)?);
        }
    }

    tracing::debug!(meshes = out.len(), "glTF decode complete");
    Ok(out)
}

fn decode_primitive(
    doc: &Value,
    buffers: &[Vec<u8>],
    base_colors: &[[f32; 4]],
    prim: &Value,
    name: &str,
) -> Result<MeshData, AssetError> {
    // Mode 4 (TRIANGLES) is the glTF default when absent.
    let mode = prim.get("mode").and_then(Value::as_u64).unwrap_or(4);
    if mode != 4 {
        return Err(AssetError::Unsupported(format!(
            "primitive mode {mode} (only TRIANGLES)"
        )));
    }

    let attributes = prim
        .get("attributes")
        .ok_or_else(|| AssetError::Malformed(format!("primitive {name} has no attributes")))?;

    let position_accessor = attributes
        .get("POSITION")
        .and_then(Value::as_u64)
        .ok_or_else(|| AssetError::Malformed(format!("primitive {name} has no POSITION")))?;
    let positions = read_vec3(doc, buffers, position_accessor)?;

    let indices = match prim.get("indices").and_then(Value::as_u64) {
        Some(accessor) => read_indices(doc, buffers, accessor)?,
        None => (0..positions.len() as u32).collect(),
    };
    if let Some(max) = indices.iter().max() {
        if *max as usize >= positions.len() {
            return Err(AssetError::Malformed(format!(
                "index {max} out of range for {} vertices",
                positions.len()
            )));
        }
    }

    let normals = match attributes.get("NORMAL").and_then(Value::as_u64) {
        Some(accessor) => {
            let normals = read_vec3(doc, buffers, accessor)?;
            if normals.len() != positions.len() {
                return Err(AssetError::Malformed(format!(
                    "NORMAL count {} does not match POSITION count {}",
                    normals.len(),
                    positions.len()
                )));
            }
            normals
        }
        None => flat_normals(&positions, &indices),
    };

    let base_color = prim
        .get("material")
        .and_then(Value::as_u64)
        .and_then(|m| base_colors.get(m as usize).copied())
        .unwrap_or(DEFAULT_BASE_COLOR);

    Ok(MeshData {
        name: name.to_string(),
        positions,
        normals,
        indices,
        base_color,
    })
}

/// Resolve every buffer to bytes. Only external file URIs are supported.
fn load_buffers(doc: &Value, base_dir: &Path) -> Result<Vec<Vec<u8>>, AssetError> {
    let empty = Vec::new();
    let buffers = doc
        .get("buffers")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut out = Vec::with_capacity(buffers.len());
    for (i, buffer) in buffers.iter().enumerate() {
        let uri = buffer.get("uri").and_then(Value::as_str).ok_or_else(|| {
            AssetError::Unsupported(format!("buffer {i} has no uri (GLB chunk?)"))
        })?;
        if uri.starts_with("data:") {
            return Err(AssetError::Unsupported(format!("buffer {i} is a data URI")));
        }
        let bytes = std::fs::read(base_dir.join(uri))?;
        let expected = buffer.get("byteLength").and_then(Value::as_u64).unwrap_or(0) as usize;
        if bytes.len() < expected {
            return Err(AssetError::Malformed(format!(
                "buffer {i}: file {uri} holds {} bytes, document declares {expected}",
                bytes.len()
            )));
        }
        out.push(bytes);
    }
    Ok(out)
}

/// Per-material base color from pbrMetallicRoughness, indexed by material.
fn material_base_colors(doc: &Value) -> Vec<[f32; 4]> {
    let empty = Vec::new();
    let materials = doc
        .get("materials")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    materials
        .iter()
        .map(|mat| {
            mat.get("pbrMetallicRoughness")
                .and_then(|pbr| pbr.get("baseColorFactor"))
                .and_then(Value::as_array)
                .map(|arr| {
                    let mut color = DEFAULT_BASE_COLOR;
                    for (i, v) in arr.iter().enumerate().take(4) {
                        if let Some(f) = v.as_f64() {
                            color[i] = f as f32;
                        }
                    }
                    color
                })
                .unwrap_or(DEFAULT_BASE_COLOR)
        })
        .collect()
}

/// Raw bytes and layout for one accessor.
struct AccessorView<'a> {
    data: &'a [u8],
    offset: usize,
    stride: Option<usize>,
    count: usize,
    component_type: u64,
    element_type: String,
}

fn accessor_view<'a>(
    doc: &Value,
    buffers: &'a [Vec<u8>],
    index: u64,
) -> Result<AccessorView<'a>, AssetError> {
    let accessor = doc
        .get("accessors")
        .and_then(Value::as_array)
        .and_then(|a| a.get(index as usize))
        .ok_or_else(|| AssetError::Malformed(format!("accessor {index} out of range")))?;

    let view_index = accessor
        .get("bufferView")
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            AssetError::Unsupported(format!("accessor {index} has no bufferView (sparse?)"))
        })?;
    let view = doc
        .get("bufferViews")
        .and_then(Value::as_array)
        .and_then(|v| v.get(view_index as usize))
        .ok_or_else(|| AssetError::Malformed(format!("bufferView {view_index} out of range")))?;

    let buffer_index = view
        .get("buffer")
        .and_then(Value::as_u64)
        .ok_or_else(|| AssetError::Malformed(format!("bufferView {view_index} has no buffer")))?;
    let buffer = buffers.get(buffer_index as usize).ok_or_else(|| {
        AssetError::Malformed(format!("buffer {buffer_index} out of range"))
    })?;

    let view_offset = view.get("byteOffset").and_then(Value::as_u64).unwrap_or(0) as usize;
    let view_length = view
        .get("byteLength")
        .and_then(Value::as_u64)
        .ok_or_else(|| AssetError::Malformed(format!("bufferView {view_index} has no byteLength")))?
        as usize;
    let data = buffer
        .get(view_offset..view_offset + view_length)
        .ok_or_else(|| {
            AssetError::Malformed(format!("bufferView {view_index} exceeds buffer bounds"))
        })?;

    Ok(AccessorView {
        data,
        offset: accessor.get("byteOffset").and_then(Value::as_u64).unwrap_or(0) as usize,
        stride: view
            .get("byteStride")
            .and_then(Value::as_u64)
            .map(|s| s as usize),
        count: accessor.get("count").and_then(Value::as_u64).unwrap_or(0) as usize,
        component_type: accessor
            .get("componentType")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        element_type: accessor
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
    })
}

fn read_vec3(doc: &Value, buffers: &[Vec<u8>], index: u64) -> Result<Vec<[f32; 3]>, AssetError> {
    let view = accessor_view(doc, buffers, index)?;
    if view.component_type != COMPONENT_F32 || view.element_type != "VEC3" {
        return Err(AssetError::Unsupported(format!(
            "accessor {index}: expected float VEC3, got {} / {}",
            view.component_type, view.element_type
        )));
    }

    let stride = view.stride.unwrap_or(12);
    let mut out = Vec::with_capacity(view.count);
    for i in 0..view.count {
        let base = view.offset + i * stride;
        let bytes = view.data.get(base..base + 12).ok_or_else(|| {
            AssetError::Malformed(format!("accessor {index} element {i} out of bounds"))
        })?;
        out.push([
            f32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            f32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            f32::from_le_bytes(bytes[8..12].try_into().unwrap()),
        ]);
    }
    Ok(out)
}

fn read_indices(doc: &Value, buffers: &[Vec<u8>], index: u64) -> Result<Vec<u32>, AssetError> {
    let view = accessor_view(doc, buffers, index)?;
    if view.element_type != "SCALAR" {
        return Err(AssetError::Unsupported(format!(
            "accessor {index}: index type {}",
            view.element_type
        )));
    }

    let width = match view.component_type {
        COMPONENT_U8 => 1,
        COMPONENT_U16 => 2,
        COMPONENT_U32 => 4,
        other => {
            return Err(AssetError::Unsupported(format!(
                "accessor {index}: index component type {other}"
            )));
        }
    };

    let stride = view.stride.unwrap_or(width);
    let mut out = Vec::with_capacity(view.count);
    for i in 0..view.count {
        let base = view.offset + i * stride;
        let bytes = view.data.get(base..base + width).ok_or_else(|| {
            AssetError::Malformed(format!("accessor {index} element {i} out of bounds"))
        })?;
        out.push(match width {
            1 => bytes[0] as u32,
            2 => u16::from_le_bytes(bytes.try_into().unwrap()) as u32,
            _ => u32::from_le_bytes(bytes.try_into().unwrap()),
        });
    }
    Ok(out)
}

/// Area-weighted face normals for primitives that ship without NORMAL data.
fn flat_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [
            Vec3::from(positions[tri[0] as usize]),
            Vec3::from(positions[tri[1] as usize]),
            Vec3::from(positions[tri[2] as usize]),
        ];
        let face = (b - a).cross(c - a);
        for &i in tri {
            acc[i as usize] += face;
        }
    }
    acc.into_iter()
        .map(|n| n.normalize_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    /// Write a glTF document plus external buffer into a temp dir.
    fn write_fixture(doc: &Value, bin: &[u8]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scene.bin"), bin).unwrap();
        let mut f = std::fs::File::create(dir.path().join("scene.gltf")).unwrap();
        f.write_all(doc.to_string().as_bytes()).unwrap();
        dir
    }

    fn triangle_bin() -> Vec<u8> {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mut bin = Vec::new();
        for p in positions {
            for c in p {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        bin
    }

    fn triangle_doc(bin_len: usize) -> Value {
        json!({
            "asset": { "version": "2.0" },
            "buffers": [{ "uri": "scene.bin", "byteLength": bin_len }],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ],
            "materials": [{
                "name": "red",
                "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] }
            }],
            "meshes": [{
                "name": "tri",
                "primitives": [{
                    "attributes": { "POSITION": 0 },
                    "indices": 1,
                    "material": 0
                }]
            }]
        })
    }

    #[test]
    fn decodes_triangle_with_material() {
        let bin = triangle_bin();
        let dir = write_fixture(&triangle_doc(bin.len()), &bin);

        let meshes = load_gltf(dir.path().join("scene.gltf")).unwrap();
        assert_eq!(meshes.len(), 1);
        let mesh = &meshes[0];
        assert_eq!(mesh.name, "tri");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.positions[1], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.base_color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn derives_flat_normals_when_absent() {
        let bin = triangle_bin();
        let dir = write_fixture(&triangle_doc(bin.len()), &bin);

        let meshes = load_gltf(dir.path().join("scene.gltf")).unwrap();
        // CCW triangle in the XY plane faces +Z.
        for n in &meshes[0].normals {
            assert!((Vec3::from(*n) - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn unindexed_primitive_gets_sequential_indices() {
        let bin = triangle_bin();
        let mut doc = triangle_doc(bin.len());
        doc["meshes"][0]["primitives"][0]
            .as_object_mut()
            .unwrap()
            .remove("indices");
        let dir = write_fixture(&doc, &bin);

        let meshes = load_gltf(dir.path().join("scene.gltf")).unwrap();
        assert_eq!(meshes[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_data_uri_buffers() {
        let bin = triangle_bin();
        let mut doc = triangle_doc(bin.len());
        doc["buffers"][0]["uri"] = json!("data:application/octet-stream;base64,AAAA");
        let dir = write_fixture(&doc, &bin);

        let err = load_gltf(dir.path().join("scene.gltf")).unwrap_err();
        assert!(matches!(err, AssetError::Unsupported(_)));
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let bin = triangle_bin();
        let mut doc = triangle_doc(bin.len());
        doc["accessors"][0]["count"] = json!(2);
        let dir = write_fixture(&doc, &bin);

        let err = load_gltf(dir.path().join("scene.gltf")).unwrap_err();
        assert!(matches!(err, AssetError::Malformed(_)));
    }

    #[test]
    fn rejects_truncated_buffer_file() {
        let bin = triangle_bin();
        let mut doc = triangle_doc(bin.len());
        doc["buffers"][0]["byteLength"] = json!(9999);
        let dir = write_fixture(&doc, &bin);

        let err = load_gltf(dir.path().join("scene.gltf")).unwrap_err();
        assert!(matches!(err, AssetError::Malformed(_)));
    }

    #[test]
    fn invalid_json_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.gltf");
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(load_gltf(&path).unwrap_err(), AssetError::Json(_)));
    }

    #[test]
    fn content_digest_is_stable_and_short() {
        let a = content_digest(b"hello");
        let b = content_digest(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_ne!(a, content_digest(b"world"));
    }
}
