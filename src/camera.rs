use glam::{Mat4, Vec3};

/// Camera uniform uploaded to the GPU — the combined view-projection
/// matrix, column-major to match WGSL `mat4x4<f32>`.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Fixed perspective camera over the 3D scene.
///
/// Defaults reproduce the classic "over-the-shoulder plane" view: the eye
/// sits at (0, 100, 100) looking down at the origin with a 45° vertical
/// field of view, near 1, far 1000.
pub struct SceneCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 100.0, 100.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_deg: 45.0,
            near: 1.0,
            far: 1000.0,
        }
    }
}

impl SceneCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combined view-projection matrix for the given viewport aspect ratio.
    /// Right-handed, depth mapped to [0, 1] (wgpu clip-space convention).
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov_y_deg.to_radians(), aspect, self.near, self.far);
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        proj * view
    }

    /// Build the GPU-ready uniform for the given viewport dimensions.
    pub fn build_view_proj(&self, width: f32, height: f32) -> CameraUniform {
        let aspect = if height > 0.0 { width / height } else { 1.0 };
        CameraUniform {
            view_proj: self.view_proj(aspect).to_cols_array_2d(),
        }
    }

    /// Project a world-space point to window coordinates.
    ///
    /// Returns `[x, y, depth]`: x grows right, y grows **down** from the
    /// top-left corner, and depth is the NDC z in [0, 1] for points
    /// between the near and far planes. No clipping is applied — points
    /// outside the frustum simply land outside the viewport rectangle.
    pub fn project(&self, world: Vec3, viewport_w: f32, viewport_h: f32) -> Vec3 {
        let aspect = if viewport_h > 0.0 { viewport_w / viewport_h } else { 1.0 };
        let ndc = self.view_proj(aspect).project_point3(world);
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * viewport_w,
            (1.0 - ndc.y) * 0.5 * viewport_h,
            ndc.z,
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const W: f32 = 640.0;
    const H: f32 = 480.0;

    #[test]
    fn look_at_target_projects_to_viewport_center() {
        let cam = SceneCamera::new();
        let p = cam.project(Vec3::ZERO, W, H);
        assert!((p.x - W / 2.0).abs() < 1e-3, "x = {}", p.x);
        assert!((p.y - H / 2.0).abs() < 1e-3, "y = {}", p.y);
    }

    #[test]
    fn point_right_of_target_projects_right_of_center() {
        let cam = SceneCamera::new();
        let p = cam.project(Vec3::new(10.0, 0.0, 0.0), W, H);
        assert!(p.x > W / 2.0);
    }

    #[test]
    fn point_above_target_projects_above_center() {
        let cam = SceneCamera::new();
        // +Y world is up; window y grows down, so the projection is smaller.
        let p = cam.project(Vec3::new(0.0, 10.0, 0.0), W, H);
        assert!(p.y < H / 2.0);
    }

    #[test]
    fn depth_between_near_and_far_is_unit_range() {
        let cam = SceneCamera::new();
        let p = cam.project(Vec3::ZERO, W, H);
        assert!(p.z > 0.0 && p.z < 1.0, "depth = {}", p.z);
    }

    #[test]
    fn nearer_points_have_smaller_depth() {
        let cam = SceneCamera::new();
        // Toward the eye along the view axis.
        let near = cam.project(Vec3::new(0.0, 50.0, 50.0), W, H);
        let far = cam.project(Vec3::new(0.0, -20.0, -20.0), W, H);
        assert!(near.z < far.z);
    }

    #[test]
    fn uniform_matches_view_proj_columns() {
        let cam = SceneCamera::new();
        let u = cam.build_view_proj(W, H);
        let m = cam.view_proj(W / H).to_cols_array_2d();
        assert_eq!(u.view_proj, m);
    }
}
