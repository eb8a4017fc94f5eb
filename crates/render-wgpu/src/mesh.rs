//! Hard-coded primitive meshes.
//!
//! All meshes wind counter-clockwise when seen from outside, matching the
//! back-face culling of the scene pipeline. The skybox is the exception: it
//! is drawn without culling and only carries positions.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// CPU-side indexed triangle list.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

/// Unit plane on y = 0 spanning -1..1 in X and Z, facing +Y.
/// Each corner carries its own colour.
pub fn plane() -> MeshData {
    #[rustfmt::skip]
    let vertices = vec![
        Vertex { position: [ 1.0, 0.0,  1.0], color: [1.0, 0.0, 0.0], uv: [1.0, 1.0] },
        Vertex { position: [ 1.0, 0.0, -1.0], color: [0.0, 1.0, 0.0], uv: [1.0, 0.0] },
        Vertex { position: [-1.0, 0.0, -1.0], color: [0.0, 0.0, 1.0], uv: [0.0, 0.0] },
        Vertex { position: [-1.0, 0.0,  1.0], color: [1.0, 1.0, 0.0], uv: [0.0, 1.0] },
    ];
    MeshData {
        vertices,
        indices: vec![0, 1, 3, 1, 2, 3],
    }
}

/// Unit cube centred on the origin, one full texture per face.
pub fn cube() -> MeshData {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let faces: [[[f32; 3]; 4]; 6] = [
        // +Z
        [[-p, -p,  p], [ p, -p,  p], [ p,  p,  p], [-p,  p,  p]],
        // -Z
        [[ p, -p, -p], [-p, -p, -p], [-p,  p, -p], [ p,  p, -p]],
        // +X
        [[ p, -p,  p], [ p, -p, -p], [ p,  p, -p], [ p,  p,  p]],
        // -X
        [[-p, -p, -p], [-p, -p,  p], [-p,  p,  p], [-p,  p, -p]],
        // +Y
        [[-p,  p,  p], [ p,  p,  p], [ p,  p, -p], [-p,  p, -p]],
        // -Y
        [[-p, -p, -p], [ p, -p, -p], [ p, -p,  p], [-p, -p,  p]],
    ];
    const CORNER_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for face in faces {
        let base = vertices.len() as u16;
        for (position, uv) in face.into_iter().zip(CORNER_UVS) {
            vertices.push(Vertex {
                position,
                color: WHITE,
                uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    MeshData { vertices, indices }
}

/// Upper bound on sphere `segments` and `rings`; keeps every vertex
/// addressable by a `u16` index.
pub const MAX_SPHERE_RESOLUTION: u16 = 254;

/// UV sphere. `segments` slices around Y, `rings` stacks from pole to pole.
/// Both are clamped to `3..=254` and `2..=254`.
pub fn uv_sphere(radius: f32, segments: u16, rings: u16) -> MeshData {
    let segments = segments.clamp(3, MAX_SPHERE_RESOLUTION);
    let rings = rings.clamp(2, MAX_SPHERE_RESOLUTION);
    let mut vertices = Vec::with_capacity((segments as usize + 1) * (rings as usize + 1));

    for r in 0..=rings {
        let v = r as f32 / rings as f32;
        let phi = v * std::f32::consts::PI;
        for s in 0..=segments {
            let u = s as f32 / segments as f32;
            let theta = u * std::f32::consts::TAU;
            vertices.push(Vertex {
                position: [
                    radius * phi.sin() * theta.cos(),
                    radius * phi.cos(),
                    radius * phi.sin() * theta.sin(),
                ],
                color: WHITE,
                uv: [u, 1.0 - v],
            });
        }
    }

    let stride = segments + 1;
    let mut indices = Vec::with_capacity(segments as usize * rings as usize * 6);
    for r in 0..rings {
        for s in 0..segments {
            let a = r * stride + s;
            let b = a + stride;
            // The first and last rings collapse to a pole; skip their
            // zero-area halves.
            if r != 0 {
                indices.extend_from_slice(&[a, a + 1, b]);
            }
            if r != rings - 1 {
                indices.extend_from_slice(&[a + 1, b + 1, b]);
            }
        }
    }
    MeshData { vertices, indices }
}

/// Positions of a ±1 cube as 36 unindexed vertices, for the skybox.
pub fn skybox() -> Vec<[f32; 3]> {
    #[rustfmt::skip]
    let positions = vec![
        [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
        [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],

        [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
        [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],

        [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],

        [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],

        [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],

        [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
        [ 1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
    ];
    positions
}

/// Vertex and index buffers for one [`MeshData`], uploaded once.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}
