//! Mapblock mesh data, GPU upload and on-disk mesh dumps.

use std::path::{Path, PathBuf};

use blockshade_shading::MapblockVertex;
use glam::{IVec3, Vec2, Vec3};
use serde::Deserialize;
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::frustum::BoundingSphere;
use crate::texture::FALLBACK_TEXTURE_INDEX;

/// Nodes along each edge of a mapblock.
pub const MAPBLOCK_SIZE: i32 = 16;

/// Two clockwise triangles per quad.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3, 3 => Uint32];

/// Vertex buffer layout matching [`MapblockVertex`].
pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MapblockVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Unit cube faces centred on the origin, four vertices each, in the order
/// +Y, -Y, +X, -X, +Z, -Z.
#[rustfmt::skip]
const CUBE_FACES: [[(Vec3, Vec2); 4]; 6] = [
    // Top
    [
        (Vec3::new(-0.5, 0.5, 0.5), Vec2::new(0.0, 0.0)),
        (Vec3::new(0.5, 0.5, 0.5), Vec2::new(1.0, 0.0)),
        (Vec3::new(0.5, 0.5, -0.5), Vec2::new(1.0, 1.0)),
        (Vec3::new(-0.5, 0.5, -0.5), Vec2::new(0.0, 1.0)),
    ],
    // Bottom
    [
        (Vec3::new(-0.5, -0.5, -0.5), Vec2::new(0.0, 0.0)),
        (Vec3::new(0.5, -0.5, -0.5), Vec2::new(1.0, 0.0)),
        (Vec3::new(0.5, -0.5, 0.5), Vec2::new(1.0, 1.0)),
        (Vec3::new(-0.5, -0.5, 0.5), Vec2::new(0.0, 1.0)),
    ],
    // East
    [
        (Vec3::new(0.5, 0.5, -0.5), Vec2::new(0.0, 0.0)),
        (Vec3::new(0.5, 0.5, 0.5), Vec2::new(1.0, 0.0)),
        (Vec3::new(0.5, -0.5, 0.5), Vec2::new(1.0, 1.0)),
        (Vec3::new(0.5, -0.5, -0.5), Vec2::new(0.0, 1.0)),
    ],
    // West
    [
        (Vec3::new(-0.5, 0.5, 0.5), Vec2::new(0.0, 0.0)),
        (Vec3::new(-0.5, 0.5, -0.5), Vec2::new(1.0, 0.0)),
        (Vec3::new(-0.5, -0.5, -0.5), Vec2::new(1.0, 1.0)),
        (Vec3::new(-0.5, -0.5, 0.5), Vec2::new(0.0, 1.0)),
    ],
    // North
    [
        (Vec3::new(0.5, 0.5, 0.5), Vec2::new(0.0, 0.0)),
        (Vec3::new(-0.5, 0.5, 0.5), Vec2::new(1.0, 0.0)),
        (Vec3::new(-0.5, -0.5, 0.5), Vec2::new(1.0, 1.0)),
        (Vec3::new(0.5, -0.5, 0.5), Vec2::new(0.0, 1.0)),
    ],
    // South
    [
        (Vec3::new(-0.5, 0.5, -0.5), Vec2::new(0.0, 0.0)),
        (Vec3::new(0.5, 0.5, -0.5), Vec2::new(1.0, 0.0)),
        (Vec3::new(0.5, -0.5, -0.5), Vec2::new(1.0, 1.0)),
        (Vec3::new(-0.5, -0.5, -0.5), Vec2::new(0.0, 1.0)),
    ],
];

/// One face of an axis-aligned unit cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// +Y
    Top,
    /// -Y
    Bottom,
    /// +X
    East,
    /// -X
    West,
    /// +Z
    North,
    /// -Z
    South,
}

impl CubeFace {
    /// All faces in +Y, -Y, +X, -X, +Z, -Z order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Top,
        CubeFace::Bottom,
        CubeFace::East,
        CubeFace::West,
        CubeFace::North,
        CubeFace::South,
    ];

    /// Outward unit normal.
    pub fn normal(self) -> Vec3 {
        match self {
            CubeFace::Top => Vec3::Y,
            CubeFace::Bottom => Vec3::NEG_Y,
            CubeFace::East => Vec3::X,
            CubeFace::West => Vec3::NEG_X,
            CubeFace::North => Vec3::Z,
            CubeFace::South => Vec3::NEG_Z,
        }
    }

    fn corners(self) -> &'static [(Vec3, Vec2); 4] {
        &CUBE_FACES[self as usize]
    }
}

/// Errors produced when validating or loading mesh data.
#[derive(Debug, Error)]
pub enum MeshDumpError {
    /// The dump file could not be read.
    #[error("failed to read mesh dump {path}: {source}")]
    Io {
        /// Dump path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The dump is not valid JSON for the expected shape.
    #[error("invalid mesh dump: {0}")]
    Parse(#[from] serde_json::Error),
    /// The index list is not made of whole triangles.
    #[error("mapblock {blockpos} has {count} indices, not a multiple of 3")]
    PartialTriangle {
        /// Offending mapblock.
        blockpos: IVec3,
        /// Number of indices found.
        count: usize,
    },
    /// An index refers past the end of the vertex list.
    #[error("mapblock {blockpos} index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending mapblock.
        blockpos: IVec3,
        /// The bad index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
    /// A vertex names a texture slot that is not bound.
    #[error("mapblock {blockpos} uses texture slot {index} but only {texture_count} are bound")]
    TextureOutOfRange {
        /// Offending mapblock.
        blockpos: IVec3,
        /// The bad slot.
        index: u32,
        /// Number of bound textures.
        texture_count: u32,
    },
}

/// CPU-side triangle list for one mapblock, in world space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Mapblock coordinates (node position divided by [`MAPBLOCK_SIZE`]).
    pub blockpos: IVec3,
    /// Vertices in world space.
    pub vertices: Vec<MapblockVertex>,
    /// Clockwise triangle indices into `vertices`.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Empty mesh for `blockpos`.
    pub fn new(blockpos: IVec3) -> Self {
        Self {
            blockpos,
            ..Default::default()
        }
    }

    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append the six faces of a unit cube centred on `center`.
    ///
    /// `textures` holds one texture slot per face, in +Y, -Y, +X, -X, +Z, -Z order.
    pub fn push_cube(&mut self, center: Vec3, textures: [u32; 6]) {
        for (face, texture_index) in CubeFace::ALL.into_iter().zip(textures) {
            self.push_face(center, face, texture_index);
        }
    }

    /// Append one face of a unit cube centred on `center`.
    pub fn push_face(&mut self, center: Vec3, face: CubeFace, texture_index: u32) {
        let base = self.vertices.len() as u32;
        let normal = face.normal();
        self.vertices
            .extend(face.corners().iter().map(|&(position, uv)| {
                MapblockVertex::new(center + position, uv, normal, texture_index)
            }));
        self.indices.extend(QUAD_INDICES.iter().map(|index| base + index));
    }

    /// Check that indices form whole triangles over existing vertices.
    pub fn validate(&self) -> Result<(), MeshDumpError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshDumpError::PartialTriangle {
                blockpos: self.blockpos,
                count: self.indices.len(),
            });
        }
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&index| index as usize >= self.vertices.len())
        {
            return Err(MeshDumpError::IndexOutOfRange {
                blockpos: self.blockpos,
                index,
                vertex_count: self.vertices.len(),
            });
        }
        Ok(())
    }

    /// Fail if any vertex names a slot outside `0..texture_count`.
    pub fn check_texture_slots(&self, texture_count: u32) -> Result<(), MeshDumpError> {
        match self
            .vertices
            .iter()
            .find(|vertex| vertex.texture_index >= texture_count)
        {
            Some(vertex) => Err(MeshDumpError::TextureOutOfRange {
                blockpos: self.blockpos,
                index: vertex.texture_index,
                texture_count,
            }),
            None => Ok(()),
        }
    }

    /// Point vertices with unbound texture slots at the fallback texture.
    ///
    /// Returns how many vertices were changed.
    pub fn remap_missing_textures(&mut self, texture_count: u32) -> usize {
        let mut remapped = 0;
        for vertex in &mut self.vertices {
            if vertex.texture_index >= texture_count {
                vertex.texture_index = FALLBACK_TEXTURE_INDEX;
                remapped += 1;
            }
        }
        remapped
    }

    /// Sphere around all vertices, or `None` for a vertex-less mesh.
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        let first = self.vertices.first()?.position;
        let (min, max) = self
            .vertices
            .iter()
            .fold((first, first), |(min, max), vertex| {
                (min.min(vertex.position), max.max(vertex.position))
            });
        Some(BoundingSphere::from_aabb(min, max))
    }
}

/// A mapblock mesh resident on the GPU.
pub struct MapblockMesh {
    buffers: Option<(wgpu::Buffer, wgpu::Buffer)>,
    index_count: u32,
    bounds: Option<BoundingSphere>,
}

impl MapblockMesh {
    /// Upload `data`. Empty meshes allocate no buffers.
    pub fn upload(device: &wgpu::Device, data: &MeshData) -> Self {
        if data.is_empty() {
            return Self {
                buffers: None,
                index_count: 0,
                bounds: None,
            };
        }

        let label = format!("Mapblock {}", data.blockpos);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            buffers: Some((vertex_buffer, index_buffer)),
            index_count: data.indices.len() as u32,
            bounds: data.bounding_sphere(),
        }
    }

    /// Number of indices to draw.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// World-space bounds, if the mesh has geometry.
    pub fn bounds(&self) -> Option<&BoundingSphere> {
        self.bounds.as_ref()
    }

    /// Record the draw for this mesh. Does nothing for empty meshes.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        if let Some((vertex_buffer, index_buffer)) = &self.buffers {
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }
    }
}

#[derive(Debug, Deserialize)]
struct VertexDump {
    position: [f32; 3],
    uv: [f32; 2],
    normal: [f32; 3],
    texture_index: u32,
}

#[derive(Debug, Deserialize)]
struct MeshDump {
    blockpos: [i32; 3],
    vertices: Vec<VertexDump>,
    indices: Vec<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MeshDumpFile {
    Single(MeshDump),
    Many(Vec<MeshDump>),
}

impl From<MeshDump> for MeshData {
    fn from(dump: MeshDump) -> Self {
        Self {
            blockpos: IVec3::from_array(dump.blockpos),
            vertices: dump
                .vertices
                .into_iter()
                .map(|vertex| {
                    MapblockVertex::new(
                        Vec3::from_array(vertex.position),
                        Vec2::from_array(vertex.uv),
                        Vec3::from_array(vertex.normal),
                        vertex.texture_index,
                    )
                })
                .collect(),
            indices: dump.indices,
        }
    }
}

/// Parse a JSON mesh dump holding one mesh object or an array of them.
pub fn parse_mesh_dump(json: &str) -> Result<Vec<MeshData>, MeshDumpError> {
    let dumps = match serde_json::from_str::<MeshDumpFile>(json)? {
        MeshDumpFile::Single(dump) => vec![dump],
        MeshDumpFile::Many(dumps) => dumps,
    };

    let meshes: Vec<MeshData> = dumps.into_iter().map(MeshData::from).collect();
    for mesh in &meshes {
        mesh.validate()?;
    }
    Ok(meshes)
}

/// Read and parse a mesh dump from disk.
pub fn load_mesh_dump(path: &Path) -> Result<Vec<MeshData>, MeshDumpError> {
    let json = std::fs::read_to_string(path).map_err(|source| MeshDumpError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_mesh_dump(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_vertex_struct() {
        let layout = vertex_layout();
        assert_eq!(layout.array_stride, 36);

        let offsets: Vec<u64> = layout.attributes.iter().map(|attr| attr.offset).collect();
        assert_eq!(offsets, [0, 12, 20, 32]);
        assert_eq!(layout.attributes[3].format, wgpu::VertexFormat::Uint32);
    }

    #[test]
    fn cube_has_six_quads_with_outward_normals() {
        let mut mesh = MeshData::new(IVec3::ZERO);
        mesh.push_cube(Vec3::new(3.0, 4.0, 5.0), [1, 2, 3, 4, 5, 6]);

        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        mesh.validate().unwrap();

        for (face, quad) in mesh.vertices.chunks(4).enumerate() {
            for vertex in quad {
                let offset = vertex.position - Vec3::new(3.0, 4.0, 5.0);
                assert!((offset.dot(vertex.normal) - 0.5).abs() < 1e-6);
                assert_eq!(vertex.texture_index, face as u32 + 1);
            }
        }
    }

    #[test]
    fn face_normals_match_cube_order() {
        let mut mesh = MeshData::new(IVec3::ZERO);
        for face in CubeFace::ALL {
            mesh.push_face(Vec3::ZERO, face, 0);
        }
        let normals: Vec<Vec3> = mesh.vertices.chunks(4).map(|quad| quad[0].normal).collect();
        assert_eq!(
            normals,
            [Vec3::Y, Vec3::NEG_Y, Vec3::X, Vec3::NEG_X, Vec3::Z, Vec3::NEG_Z]
        );
    }

    #[test]
    fn second_face_indices_are_offset() {
        let mut mesh = MeshData::new(IVec3::ZERO);
        mesh.push_face(Vec3::ZERO, CubeFace::Top, 0);
        mesh.push_face(Vec3::ZERO, CubeFace::Bottom, 0);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn bounding_sphere_encloses_vertices() {
        let mut mesh = MeshData::new(IVec3::ZERO);
        mesh.push_cube(Vec3::splat(0.5), [0; 6]);
        mesh.push_cube(Vec3::splat(15.5), [0; 6]);

        let sphere = mesh.bounding_sphere().unwrap();
        assert!(sphere.center.abs_diff_eq(Vec3::splat(8.0), 1e-6));
        for vertex in &mesh.vertices {
            assert!(vertex.position.distance(sphere.center) <= sphere.radius + 1e-4);
        }
        assert_eq!(MeshData::new(IVec3::ZERO).bounding_sphere(), None);
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let mut mesh = MeshData::new(IVec3::new(1, 2, 3));
        mesh.push_face(Vec3::ZERO, CubeFace::Top, 0);
        mesh.indices[2] = 9;

        let err = mesh.validate().unwrap_err();
        assert!(matches!(err, MeshDumpError::IndexOutOfRange { index: 9, .. }));
    }

    #[test]
    fn validate_rejects_partial_triangle() {
        let mut mesh = MeshData::new(IVec3::ZERO);
        mesh.push_face(Vec3::ZERO, CubeFace::Top, 0);
        mesh.indices.pop();

        assert!(matches!(
            mesh.validate(),
            Err(MeshDumpError::PartialTriangle { count: 5, .. })
        ));
    }

    #[test]
    fn parses_single_and_multiple_dumps() {
        let single = r#"{
            "blockpos": [0, -1, 2],
            "vertices": [
                {"position": [0, 0, 0], "uv": [0, 0], "normal": [0, 1, 0], "texture_index": 3},
                {"position": [1, 0, 0], "uv": [1, 0], "normal": [0, 1, 0], "texture_index": 3},
                {"position": [1, 0, 1], "uv": [1, 1], "normal": [0, 1, 0], "texture_index": 3}
            ],
            "indices": [0, 1, 2]
        }"#;
        let meshes = parse_mesh_dump(single).unwrap();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].blockpos, IVec3::new(0, -1, 2));
        assert_eq!(meshes[0].vertices[2].position, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(meshes[0].vertices[0].texture_index, 3);

        let many = format!("[{single}, {single}]");
        assert_eq!(parse_mesh_dump(&many).unwrap().len(), 2);
    }

    #[test]
    fn dump_with_bad_index_is_rejected() {
        let json = r#"{"blockpos": [0, 0, 0], "vertices": [], "indices": [0, 1, 2]}"#;
        assert!(matches!(
            parse_mesh_dump(json),
            Err(MeshDumpError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn unbound_texture_slots_are_detected_and_remapped() {
        let json = r#"{
            "blockpos": [2, 0, 0],
            "vertices": [
                {"position": [0, 0, 0], "uv": [0, 0], "normal": [0, 1, 0], "texture_index": 1},
                {"position": [1, 0, 0], "uv": [1, 0], "normal": [0, 1, 0], "texture_index": 4000000000},
                {"position": [1, 0, 1], "uv": [1, 1], "normal": [0, 1, 0], "texture_index": 2}
            ],
            "indices": [0, 1, 2]
        }"#;
        let mut mesh = parse_mesh_dump(json).unwrap().remove(0);

        assert!(matches!(
            mesh.check_texture_slots(2),
            Err(MeshDumpError::TextureOutOfRange {
                index: 4000000000,
                texture_count: 2,
                ..
            })
        ));

        assert_eq!(mesh.remap_missing_textures(2), 2);
        let slots: Vec<u32> = mesh.vertices.iter().map(|v| v.texture_index).collect();
        assert_eq!(slots, [1, FALLBACK_TEXTURE_INDEX, FALLBACK_TEXTURE_INDEX]);
        mesh.check_texture_slots(2).unwrap();
        assert_eq!(mesh.remap_missing_textures(2), 0);
    }

    #[test]
    fn malformed_dump_is_a_parse_error() {
        assert!(matches!(
            parse_mesh_dump("{\"blockpos\": 7}"),
            Err(MeshDumpError::Parse(_))
        ));
    }
}
