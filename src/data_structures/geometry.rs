//! CPU-side vertex data.
//!
//! Attribute arrays are reference counted so several geometries (or a cache
//! of morph targets) can point at the same data; replacing an attribute swaps
//! the reference and never writes through it.

use std::{collections::BTreeMap, sync::Arc};

use cgmath::Point3;

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub data: Arc<[f32]>,
    pub item_size: usize,
}

impl Attribute {
    pub fn new(data: Arc<[f32]>, item_size: usize) -> Self {
        Self { data, item_size }
    }

    pub fn from_vec(data: Vec<f32>, item_size: usize) -> Self {
        Self::new(data.into(), item_size)
    }

    pub fn count(&self) -> usize {
        if self.item_size == 0 {
            0
        } else {
            self.data.len() / self.item_size
        }
    }

    /// True when both attributes reference the same array.
    pub fn shares(&self, other: &Attribute) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn vec3(&self, index: usize) -> Option<Point3<f32>> {
        if self.item_size != 3 {
            return None;
        }
        let i = index * 3;
        let v = self.data.get(i..i + 3)?;
        Some(Point3::new(v[0], v[1], v[2]))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Geometry {
    attributes: BTreeMap<String, Attribute>,
    index: Option<Arc<[u32]>>,
    version: u64,
    disposed: bool,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plane in the XY plane facing +z, centred on the origin, with
    /// `position`, `normal` and `uv` attributes and a triangle index.
    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let grid_x = width_segments.max(1) as usize;
        let grid_y = height_segments.max(1) as usize;
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;

        let vertex_count = (grid_x + 1) * (grid_y + 1);
        let mut positions = Vec::with_capacity(vertex_count * 3);
        let mut normals = Vec::with_capacity(vertex_count * 3);
        let mut uvs = Vec::with_capacity(vertex_count * 2);
        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - height * 0.5;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - width * 0.5;
                positions.extend_from_slice(&[x, -y, 0.0]);
                normals.extend_from_slice(&[0.0, 0.0, 1.0]);
                uvs.extend_from_slice(&[ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32]);
            }
        }

        let row = (grid_x + 1) as u32;
        let mut indices = Vec::with_capacity(grid_x * grid_y * 6);
        for iy in 0..grid_y as u32 {
            for ix in 0..grid_x as u32 {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = ix + 1 + row * (iy + 1);
                let d = ix + 1 + row * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        let mut geometry = Self::new();
        geometry.set_attribute("position", Attribute::from_vec(positions, 3));
        geometry.set_attribute("normal", Attribute::from_vec(normals, 3));
        geometry.set_attribute("uv", Attribute::from_vec(uvs, 2));
        geometry.set_index(indices);
        geometry
    }

    pub fn set_attribute(&mut self, name: &str, attribute: Attribute) {
        self.attributes.insert(name.to_string(), attribute);
        self.version += 1;
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn set_index(&mut self, index: Vec<u32>) {
        self.index = Some(index.into());
        self.version += 1;
    }

    pub fn index(&self) -> Option<&[u32]> {
        self.index.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.attribute("position").map_or(0, Attribute::count)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Triangles of the `position` attribute in local space.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f32>; 3]> + '_ {
        let position = self.attribute("position");
        let triangle_count = match (&self.index, position) {
            (Some(index), Some(_)) => index.len() / 3,
            (None, Some(p)) => p.count() / 3,
            _ => 0,
        };
        (0..triangle_count).filter_map(move |t| {
            let position = position?;
            let corner = |k: usize| -> Option<Point3<f32>> {
                let vertex = match &self.index {
                    Some(index) => *index.get(t * 3 + k)? as usize,
                    None => t * 3 + k,
                };
                position.vec3(vertex)
            };
            Some([corner(0)?, corner(1)?, corner(2)?])
        })
    }

    /// Drops the vertex data. Returns false when already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.attributes.clear();
        self.index = None;
        self.disposed = true;
        self.version += 1;
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
