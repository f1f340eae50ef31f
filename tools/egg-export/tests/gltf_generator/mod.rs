//! Programmatic GLB generation for integration tests.
//!
//! Generates a GLB with:
//! - "Armature" node 1 unit up (glTF +Y) holding a 3-joint chain (Root -> Spine -> Head)
//! - Skin "Armature" over the three joints
//! - "Wave" (1.0s): Root translates x 0 -> 2, Spine turns 0 -> 90 -> 0 degrees about Z
//! - "Idle" (0.5s): Head scale keys that never change

use serde_json::{json, Value};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

/// Joint names in skin order
pub const BONE_NAMES: [&str; 3] = ["Root", "Spine", "Head"];

/// Height of the armature node above the origin, along glTF's up axis (Y)
pub const ARMATURE_HEIGHT: f32 = 1.0;

/// Rotation about Z by 90 degrees, as glTF xyzw
const QUARTER_TURN_Z: [f32; 4] = [
    0.0,
    0.0,
    std::f32::consts::FRAC_1_SQRT_2,
    std::f32::consts::FRAC_1_SQRT_2,
];

/// Float data packed into one buffer, one view and accessor per block
#[derive(Default)]
struct BinaryBuilder {
    data: Vec<u8>,
    buffer_views: Vec<Value>,
    accessors: Vec<Value>,
}

impl BinaryBuilder {
    fn push(&mut self, values: &[f32], kind: &str, components: usize) -> usize {
        let offset = self.data.len();
        for value in values {
            self.data.extend_from_slice(&value.to_le_bytes());
        }
        self.buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": values.len() * 4,
        }));

        let mut accessor = json!({
            "bufferView": self.buffer_views.len() - 1,
            "componentType": 5126,
            "count": values.len() / components,
            "type": kind,
        });
        if kind == "SCALAR" {
            let min = values.iter().copied().fold(f32::INFINITY, f32::min);
            let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            accessor["min"] = json!([min]);
            accessor["max"] = json!([max]);
        }
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    fn times(&mut self, times: &[f32]) -> usize {
        self.push(times, "SCALAR", 1)
    }

    fn vec3(&mut self, values: &[[f32; 3]]) -> usize {
        self.push(values.as_flattened(), "VEC3", 3)
    }

    fn vec4(&mut self, values: &[[f32; 4]]) -> usize {
        self.push(values.as_flattened(), "VEC4", 4)
    }

    /// Wrap `document` and the packed floats into a binary glTF container
    ///
    /// Both chunks are padded to 4 bytes: JSON with spaces, BIN with zeros.
    fn into_glb(self, mut document: Value) -> Vec<u8> {
        document["buffers"] = json!([{ "byteLength": self.data.len() }]);
        document["bufferViews"] = Value::Array(self.buffer_views);
        document["accessors"] = Value::Array(self.accessors);

        let mut json_bytes = serde_json::to_vec(&document).expect("Failed to serialize JSON");
        json_bytes.resize(json_bytes.len().next_multiple_of(4), b' ');
        let mut bin_bytes = self.data;
        bin_bytes.resize(bin_bytes.len().next_multiple_of(4), 0);

        let total_length = 12 + 8 + json_bytes.len() + 8 + bin_bytes.len();
        let mut glb = Vec::with_capacity(total_length);
        glb.extend_from_slice(GLB_MAGIC);
        glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
        glb.extend_from_slice(&(total_length as u32).to_le_bytes());
        for (kind, chunk) in [(CHUNK_JSON, &json_bytes), (CHUNK_BIN, &bin_bytes)] {
            glb.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
            glb.extend_from_slice(&kind.to_le_bytes());
            glb.extend_from_slice(chunk);
        }
        glb
    }
}

/// Generate the test rig GLB
pub fn generate_rig_glb() -> Vec<u8> {
    generate_rig_glb_with_names(BONE_NAMES)
}

/// Generate the test rig GLB with the given joint node names
pub fn generate_rig_glb_with_names(bone_names: [&str; 3]) -> Vec<u8> {
    let mut bin = BinaryBuilder::default();

    // Wave
    let root_times = bin.times(&[0.0, 1.0]);
    let root_translations = bin.vec3(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
    let spine_times = bin.times(&[0.0, 0.5, 1.0]);
    let spine_rotations = bin.vec4(&[
        [0.0, 0.0, 0.0, 1.0],
        QUARTER_TURN_Z,
        [0.0, 0.0, 0.0, 1.0],
    ]);

    // Idle
    let head_times = bin.times(&[0.0, 0.5]);
    let head_scales = bin.vec3(&[[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]);

    let document = json!({
        "asset": { "version": "2.0", "generator": "egg-export tests" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "Armature", "translation": [0.0, ARMATURE_HEIGHT, 0.0], "children": [1] },
            { "name": bone_names[0], "children": [2] },
            { "name": bone_names[1], "translation": [0.0, 1.0, 0.0], "children": [3] },
            { "name": bone_names[2], "translation": [0.0, 1.0, 0.0] },
        ],
        "skins": [{ "name": "Armature", "joints": [1, 2, 3] }],
        "animations": [
            {
                "name": "Wave",
                "samplers": [
                    { "input": root_times, "output": root_translations, "interpolation": "LINEAR" },
                    { "input": spine_times, "output": spine_rotations, "interpolation": "LINEAR" },
                ],
                "channels": [
                    { "sampler": 0, "target": { "node": 1, "path": "translation" } },
                    { "sampler": 1, "target": { "node": 2, "path": "rotation" } },
                ],
            },
            {
                "name": "Idle",
                "samplers": [
                    { "input": head_times, "output": head_scales, "interpolation": "STEP" },
                ],
                "channels": [
                    { "sampler": 0, "target": { "node": 3, "path": "scale" } },
                ],
            },
        ],
    });

    bin.into_glb(document)
}

/// Write the test GLB into `dir` and return its path
pub fn write_rig_glb(dir: &std::path::Path) -> std::path::PathBuf {
    write_glb(dir, "rig.glb", &generate_rig_glb())
}

/// Write GLB bytes into `dir` under `file_name` and return the path
pub fn write_glb(dir: &std::path::Path, file_name: &str, glb: &[u8]) -> std::path::PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, glb).expect("Failed to write GLB");
    path
}
