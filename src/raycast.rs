//! Ray queries against the triangles of a scene.

use cgmath::{InnerSpace, Point3, Transform, Vector3};

use crate::data_structures::{
    material::Side,
    scene_graph::{Layers, MeshId, Primitive, Scene},
};

const EPSILON: f32 = 1e-7;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Unit length.
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction * distance
    }

    /// Möller–Trumbore. Front faces wind counter-clockwise; with
    /// `cull_back` set, triangles seen from behind are ignored.
    pub fn intersect_triangle(
        &self,
        a: Point3<f32>,
        b: Point3<f32>,
        c: Point3<f32>,
        cull_back: bool,
    ) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if cull_back && det < EPSILON {
            return None;
        }
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Intersection {
    pub mesh: MeshId,
    pub distance: f32,
    pub point: Point3<f32>,
}

#[derive(Clone, Copy, Debug)]
pub struct Raycaster {
    pub near: f32,
    pub far: f32,
    pub layers: Layers,
}

impl Default for Raycaster {
    fn default() -> Self {
        Self {
            near: 0.0,
            far: f32::INFINITY,
            layers: Layers::MAIN,
        }
    }
}

impl Raycaster {
    /// Nearest hit of every visible triangle mesh, sorted by distance.
    pub fn intersect_scene(&self, ray: &Ray, scene: &Scene) -> Vec<Intersection> {
        let mut hits: Vec<Intersection> = scene
            .meshes()
            .filter(|mesh| {
                mesh.visible && mesh.primitive == Primitive::Triangles && mesh.layers.intersects(self.layers)
            })
            .filter_map(|mesh| {
                let geometry = scene.geometry(mesh.geometry)?;
                let material = scene.material(mesh.material)?;
                let cull_back = material.side == Side::Front;
                let world = mesh.world.to_matrix();
                geometry
                    .triangles()
                    .filter_map(|[a, b, c]| {
                        ray.intersect_triangle(
                            world.transform_point(a),
                            world.transform_point(b),
                            world.transform_point(c),
                            cull_back,
                        )
                    })
                    .filter(|t| *t >= self.near && *t <= self.far)
                    .min_by(|x, y| x.total_cmp(y))
                    .map(|distance| Intersection {
                        mesh: mesh.id,
                        distance,
                        point: ray.at(distance),
                    })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}
