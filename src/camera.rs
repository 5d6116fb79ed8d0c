//! Perspective cameras and the uniform block they upload.

use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Vector2, Vector3, Vector4};

use crate::{config::CameraConfig, raycast::Ray};

/// cgmath produces OpenGL clip space (z in -1..1); wgpu wants z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl PerspectiveCamera {
    /// Camera at the origin looking down -z.
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            position: Point3::new(0.0, 0.0, 0.0),
            target: Point3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
        }
    }

    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self::new(config.fov, aspect, config.near, config.far);
        camera.set_position(config.position.into());
        camera
    }

    /// Moves the camera and keeps its viewing direction.
    pub fn set_position(&mut self, position: Point3<f32>) {
        let forward = self.target - self.position;
        self.position = position;
        self.target = position + forward;
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        if (target - self.position).magnitude2() > f32::EPSILON {
            self.target = target;
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    /// OpenGL-convention projection, used for unprojection.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        cgmath::perspective(cgmath::Deg(self.fov), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection_matrix() * self.view_matrix()
    }

    /// Maps a point in normalized device coordinates back into world space.
    pub fn unproject(&self, ndc: Vector3<f32>) -> Option<Point3<f32>> {
        let inverse = (self.projection_matrix() * self.view_matrix()).invert()?;
        let world = inverse * Vector4::new(ndc.x, ndc.y, ndc.z, 1.0);
        if world.w.abs() < f32::EPSILON {
            return None;
        }
        Some(Point3::from_homogeneous(world))
    }

    /// Ray from the eye through `ndc`.
    pub fn ray_from_ndc(&self, ndc: Vector2<f32>) -> Option<Ray> {
        let through = self.unproject(Vector3::new(ndc.x, ndc.y, 0.5))?;
        let direction = through - self.position;
        if direction.magnitude2() < f32::EPSILON {
            return None;
        }
        Some(Ray::new(self.position, direction.normalize()))
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_proj().into(),
            eye: self.position.to_homogeneous().into(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            eye: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_sets_aspect() {
        let mut camera = PerspectiveCamera::new(55.0, 1.0, 0.1, 1000.0);
        camera.resize(1920.0, 1080.0);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        camera.resize(0.0, 1080.0);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn centre_ray_points_forward() {
        let mut camera = PerspectiveCamera::new(55.0, 1.5, 0.1, 1000.0);
        camera.set_position(Point3::new(0.0, 0.0, 4.0));
        let ray = camera.ray_from_ndc(Vector2::new(0.0, 0.0)).unwrap();
        assert!((ray.direction - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-4);
        assert_eq!(ray.origin, Point3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn ndc_corners_spread_by_fov() {
        let camera = PerspectiveCamera::new(90.0, 1.0, 0.1, 100.0);
        let ray = camera.ray_from_ndc(Vector2::new(0.0, 1.0)).unwrap();
        // 45 degrees up at fov 90
        assert!((ray.direction.y - ray.direction.z.abs()).abs() < 1e-3);
    }
}
