use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use blockshade_render::{load_mesh_dump, CubeFace, MeshData, MAPBLOCK_SIZE};
use glam::{IVec3, Vec3};
use tracing::{info, warn};

/// Columns along each side of the generated terrain.
const DEMO_EXTENT: i32 = 2 * MAPBLOCK_SIZE;

const SIDE_FACES: [(CubeFace, IVec3); 4] = [
    (CubeFace::East, IVec3::X),
    (CubeFace::West, IVec3::NEG_X),
    (CubeFace::North, IVec3::Z),
    (CubeFace::South, IVec3::NEG_Z),
];

/// Meshes from a dump file, or the generated terrain when no file is given.
///
/// Dumped vertices naming a slot past `texture_count` fall back to the
/// placeholder texture.
pub fn load_scene(mesh_path: Option<&Path>, texture_count: u32) -> Result<Vec<MeshData>> {
    let meshes = match mesh_path {
        Some(path) => {
            let mut meshes = load_mesh_dump(path)
                .with_context(|| format!("loading mesh dump {}", path.display()))?;
            remap_missing_textures(&mut meshes, texture_count);
            meshes
        }
        None => demo_terrain(texture_count),
    };

    let vertices: usize = meshes.iter().map(|mesh| mesh.vertices.len()).sum();
    info!(mapblocks = meshes.len(), vertices, "Scene loaded");
    Ok(meshes)
}

fn remap_missing_textures(meshes: &mut [MeshData], texture_count: u32) {
    for mesh in meshes {
        let remapped = mesh.remap_missing_textures(texture_count);
        if remapped > 0 {
            warn!(
                blockpos = %mesh.blockpos,
                vertices = remapped,
                texture_count,
                "Mesh dump names unbound texture slots; using the fallback texture"
            );
        }
    }
}

fn column_height(x: i32, z: i32) -> i32 {
    if !(0..DEMO_EXTENT).contains(&x) || !(0..DEMO_EXTENT).contains(&z) {
        return 0;
    }
    1 + (x * 3 + z * 5).rem_euclid(7) / 2
}

/// Hilly floor of cubes spread over several mapblocks, with only exposed
/// faces emitted. Texture slots cycle through `1..texture_count` so every
/// loaded texture appears; with only the fallback loaded everything uses 0.
pub fn demo_terrain(texture_count: u32) -> Vec<MeshData> {
    let mut blocks: BTreeMap<[i32; 3], MeshData> = BTreeMap::new();
    let texture_for = |x: i32, y: i32, z: i32| -> u32 {
        if texture_count <= 1 {
            0
        } else {
            1 + (x + y * 7 + z * 13).rem_euclid(texture_count as i32 - 1) as u32
        }
    };

    for x in 0..DEMO_EXTENT {
        for z in 0..DEMO_EXTENT {
            let height = column_height(x, z);
            for y in 0..height {
                let node = IVec3::new(x, y, z);
                let blockpos = node.div_euclid(IVec3::splat(MAPBLOCK_SIZE));
                let mesh = blocks
                    .entry(blockpos.to_array())
                    .or_insert_with(|| MeshData::new(blockpos));
                let center = node.as_vec3() + Vec3::splat(0.5);
                let texture = texture_for(x, y, z);

                if y == height - 1 {
                    mesh.push_face(center, CubeFace::Top, texture);
                }
                for (face, dir) in SIDE_FACES {
                    if column_height(x + dir.x, z + dir.z) <= y {
                        mesh.push_face(center, face, texture);
                    }
                }
            }
        }
    }

    blocks.into_values().collect()
}
