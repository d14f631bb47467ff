use glam::{Mat4, Vec3, Vec4};

use crate::config::LevelConfig;
use crate::utils::Mesh;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vec3::ZERO, scale: Vec3::ONE }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(self.scale)
    }
}

/// GPU buffer handles for one mesh plus the colour it is drawn with.
/// `B` is whatever the graphics backend hands back from `create_buffers`.
#[derive(Debug)]
pub struct MeshRenderer<B> {
    pub buffers: B,
    pub colour: Vec4,
}

#[derive(Debug)]
pub struct GameObject<B> {
    pub name: &'static str,
    pub transform: Transform,
    pub renderer: MeshRenderer<B>,
}

/// The fixed demo scene: a ground plane with a cube standing on it.
#[derive(Debug)]
pub struct Scene<B> {
    pub objects: Vec<GameObject<B>>,
}

impl<B> Scene<B> {
    pub const GROUND_COLOUR: Vec4 = Vec4::new(0.32, 0.45, 0.30, 1.0);
    pub const CUBE_COLOUR: Vec4 = Vec4::new(0.85, 0.35, 0.25, 1.0);

    /// Build the plane and cube, handing each mesh to `upload` once.
    pub fn build(level: &LevelConfig, mut upload: impl FnMut(&Mesh) -> B) -> Self {
        let ground = GameObject {
            name: "ground",
            transform: Transform {
                position: Vec3::ZERO,
                scale: Vec3::new(level.width as f32, 1.0, level.height as f32),
            },
            renderer: MeshRenderer {
                buffers: upload(&Mesh::plane()),
                colour: Self::GROUND_COLOUR,
            },
        };

        let cube = GameObject {
            name: "cube",
            transform: Transform {
                position: Vec3::new(0.0, 0.5, 0.0),
                scale: Vec3::ONE,
            },
            renderer: MeshRenderer {
                buffers: upload(&Mesh::cube()),
                colour: Self::CUBE_COLOUR,
            },
        };

        tracing::debug!("scene built: {}x{} ground plane and a cube", level.width, level.height);
        Self { objects: vec![ground, cube] }
    }

    /// Hand every buffer back to `destroy`, consuming the scene.
    pub fn release(self, mut destroy: impl FnMut(B)) {
        for object in self.objects {
            tracing::debug!("releasing {}", object.name);
            destroy(object.renderer.buffers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_uploads_plane_and_cube() {
        let mut uploaded = Vec::new();
        let scene = Scene::build(&LevelConfig { width: 50, height: 40 }, |mesh| {
            uploaded.push(mesh.indices.len());
            uploaded.len()
        });

        assert_eq!(uploaded, vec![6, 36]);
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.objects[0].transform.scale, Vec3::new(50.0, 1.0, 40.0));
        // Cube rests on the plane
        assert_eq!(scene.objects[1].transform.position.y, 0.5);
    }

    #[test]
    fn release_returns_every_buffer() {
        let scene = Scene::build(&LevelConfig::default(), |mesh| mesh.vertices.len());
        let mut released = Vec::new();
        scene.release(|b| released.push(b));
        assert_eq!(released, vec![4, 24]);
    }

    #[test]
    fn transform_applies_scale_then_translation() {
        let t = Transform { position: Vec3::new(1.0, 2.0, 3.0), scale: Vec3::splat(2.0) };
        let p = t.matrix().transform_point3(Vec3::ONE);
        assert_eq!(p, Vec3::new(3.0, 4.0, 5.0));
    }
}
