//! Local/world transforms of groups and meshes.
//!
//! A transform is position, rotation (quaternion) and scale. Composing a
//! parent with a child via `*` yields the child's world transform.

use std::ops::Mul;

use cgmath::{Euler, One, Rad};

#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Identity transform.
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: cgmath::Vector3::new(x, y, z),
            ..Default::default()
        }
    }

    /// Replaces the rotation with intrinsic XYZ Euler angles in radians.
    pub fn set_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = euler_to_quaternion([x, y, z]);
    }

    pub fn with_euler(mut self, x: f32, y: f32, z: f32) -> Self {
        self.set_euler(x, y, z);
        self
    }

    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = cgmath::Vector3::new(x, y, z);
        self
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> ObjectUniform {
        ObjectUniform {
            model: self.to_matrix().into(),
        }
    }
}

pub fn euler_to_quaternion(angles: [f32; 3]) -> cgmath::Quaternion<f32> {
    cgmath::Quaternion::from(Euler {
        x: Rad(angles[0]),
        y: Rad(angles[1]),
        z: Rad(angles[2]),
    })
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        Instance {
            position: self.position + (self.rotation * scaled_rhs_pos),
            rotation: self.rotation * rhs.rotation,
            scale: cgmath::Vector3::new(
                self.scale.x * rhs.scale.x,
                self.scale.y * rhs.scale.y,
                self.scale.z * rhs.scale.z,
            ),
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Self;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * Per-object block bound at group 2: the world matrix of one mesh.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Matrix4, Vector4};

    use super::*;

    #[test]
    fn composition_matches_matrix_product() {
        let parent = Instance::new()
            .with_euler(-0.1, -0.7, -0.2)
            .with_scale(1.0, -1.0, 1.0);
        let child = Instance::at(0.5, 1.2, -1.0);
        let composed = (&parent * &child).to_matrix();
        let expected: Matrix4<f32> = parent.to_matrix() * child.to_matrix();
        for col in 0..4 {
            let diff: Vector4<f32> = composed[col] - expected[col];
            assert!(diff.magnitude() < 1e-5);
        }
    }

    #[test]
    fn euler_order_is_xyz() {
        let q = euler_to_quaternion([0.3, 0.0, 0.0]);
        let rotated = q * cgmath::Vector3::unit_y();
        assert!((rotated.z - 0.3f32.sin()).abs() < 1e-6);
    }
}
