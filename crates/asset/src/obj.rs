//! Minimal OBJ parser: positions and texture coordinates, fan-triangulated.
//!
//! Every triangle corner becomes its own vertex and indices run `0..n`, so
//! the index stream mirrors the file's face stream. Normals are validated
//! and dropped; vertex color is flat white.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};

use crate::mesh::{MeshData, MeshVertex, WHITE};

pub fn load_obj_from_path(path: impl AsRef<Path>) -> Result<MeshData> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    load_obj_from_reader(BufReader::new(file))
        .with_context(|| format!("Bad OBJ file {}", path.display()))
}

/// Load an OBJ mesh, logging any failure and returning an empty mesh instead.
pub fn load_obj_or_empty(path: impl AsRef<Path>) -> MeshData {
    let path = path.as_ref();
    match load_obj_from_path(path) {
        Ok(mesh) => {
            log::info!(
                "Loaded mesh {:?}: {} vertices, {} indices",
                path,
                mesh.vertices.len(),
                mesh.indices.len()
            );
            mesh
        }
        Err(e) => {
            log::error!("Failed to load mesh: {:#}", e);
            MeshData::default()
        }
    }
}

pub fn load_obj_from_reader<R: BufRead>(reader: R) -> Result<MeshData> {
    let mut parser = ObjParser::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line.context("OBJ read failed")?;
        parser
            .feed(&line)
            .with_context(|| format!("line {}: '{}'", i + 1, line.trim()))?;
    }
    parser.finish()
}

pub fn load_obj_from_str(contents: &str) -> Result<MeshData> {
    load_obj_from_reader(contents.as_bytes())
}

/// Attribute pools plus the triangle corners emitted so far.
#[derive(Default)]
struct ObjParser {
    positions: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    normals: usize,
    corners: Vec<MeshVertex>,
    polygon: Vec<MeshVertex>,
}

impl ObjParser {
    fn feed(&mut self, line: &str) -> Result<()> {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => self.positions.push(floats(&mut tokens)?),
            Some("vt") => {
                // `vt u [v [w]]`
                let [u] = floats::<1>(&mut tokens)?;
                let v = tokens.next().map(float).transpose()?.unwrap_or(0.0);
                self.texcoords.push([u, v]);
            }
            Some("vn") => {
                floats::<3>(&mut tokens)?;
                self.normals += 1;
            }
            Some("f") => self.face(tokens)?,
            // Comments, blank lines, o/g/s/usemtl/mtllib.
            _ => {}
        }
        Ok(())
    }

    /// Fan-triangulate one polygon around its first corner.
    fn face<'a>(&mut self, tokens: impl Iterator<Item = &'a str>) -> Result<()> {
        self.polygon.clear();
        for token in tokens {
            let corner = self.corner(token)?;
            self.polygon.push(corner);
        }
        if let Some((&pivot, rest)) = self.polygon.split_first() {
            for pair in rest.windows(2) {
                self.corners.extend_from_slice(&[pivot, pair[0], pair[1]]);
            }
        }
        Ok(())
    }

    /// `p`, `p/t`, `p//n` or `p/t/n`.
    fn corner(&self, token: &str) -> Result<MeshVertex> {
        let mut refs = token.split('/');
        let p = refs.next().unwrap_or_default();
        let position = self.positions[resolve(p, self.positions.len())?];
        let uv = match refs.next().filter(|t| !t.is_empty()) {
            Some(t) => self.texcoords[resolve(t, self.texcoords.len())?],
            None => [0.0, 0.0],
        };
        if let Some(n) = refs.next().filter(|t| !t.is_empty()) {
            resolve(n, self.normals)?;
        }
        Ok(MeshVertex::new(position, WHITE, uv))
    }

    fn finish(self) -> Result<MeshData> {
        if self.corners.is_empty() {
            bail!("no triangles");
        }
        let count = u32::try_from(self.corners.len())
            .map_err(|_| anyhow!("{} corners overflow a u32 index", self.corners.len()))?;
        Ok(MeshData::new(self.corners, (0..count).collect()))
    }
}

/// First `N` floats of the remaining tokens.
fn floats<'a, const N: usize>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let token = tokens
            .next()
            .ok_or_else(|| anyhow!("expected {N} numbers, got {i}"))?;
        *slot = float(token)?;
    }
    Ok(out)
}

fn float(token: &str) -> Result<f32> {
    token
        .parse()
        .with_context(|| format!("'{token}' is not a number"))
}

/// 1-based (or negative, counted from the end) reference into a pool of `len`.
fn resolve(token: &str, len: usize) -> Result<usize> {
    let raw: i64 = token
        .parse()
        .with_context(|| format!("'{token}' is not an index"))?;
    let index = match raw {
        0 => bail!("index 0 (OBJ is 1-based)"),
        r if r > 0 => r - 1,
        r => len as i64 + r,
    };
    if index < 0 || index >= len as i64 {
        bail!("index {raw} outside 1..={len}");
    }
    Ok(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = r#"
        # unit quad
        v 0.0 0.0 0.0
        v 1.0 0.0 0.0
        v 1.0 1.0 0.0
        v 0.0 1.0 0.0
        vt 0.0 0.0
        vt 1.0 0.0
        vt 1.0 1.0
        vn 0.0 0.0 1.0
        usemtl none
        f 1/1/1 2/2/1 3/3/1 4//1
    "#;

    #[test]
    fn single_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let mesh = load_obj_from_str(src).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert!(mesh.is_valid());
        assert_eq!(mesh.vertices[1].uv, [1.0, 0.0]);
        assert!(mesh.vertices.iter().all(|v| v.color == WHITE));
    }

    #[test]
    fn quads_are_fan_triangulated_per_corner() {
        let mesh = load_obj_from_str(QUAD).unwrap();
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(mesh.vertices.len(), 6);
        let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ]
        );
    }

    #[test]
    fn missing_texcoord_defaults_to_origin() {
        let mesh = load_obj_from_str(QUAD).unwrap();
        assert_eq!(mesh.vertices[5].uv, [0.0, 0.0]);
    }

    #[test]
    fn texcoord_v_is_optional() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.5\nvt 0.25 0.75 0.0\nf 1/1 2/2 3/1\n";
        let mesh = load_obj_from_str(src).unwrap();
        assert_eq!(mesh.vertices[0].uv, [0.5, 0.0]);
        assert_eq!(mesh.vertices[1].uv, [0.25, 0.75]);
        assert!(load_obj_from_str("v 0 0 0\nvt\n").is_err());
    }

    #[test]
    fn negative_indices_are_relative() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = load_obj_from_str(src).unwrap();
        assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn bad_references_are_errors() {
        assert!(load_obj_from_str("v 0 0 0\nv 1 0 0\nf 1 2 3\n").is_err());
        assert!(load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").is_err());
        assert!(load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1 2 3\n").is_err());
        assert!(load_obj_from_str("v 0 0\n").is_err());
    }

    #[test]
    fn no_faces_is_an_error() {
        let err = load_obj_from_str("v 0 0 0\n# nothing else\n").unwrap_err();
        assert!(format!("{err:#}").contains("no triangles"));
    }

    #[test]
    fn missing_file_yields_empty_mesh() {
        let mesh = load_obj_or_empty("definitely/not/here.obj");
        assert_eq!(mesh.index_count(), 0);
        assert!(!mesh.is_valid());
    }
}
