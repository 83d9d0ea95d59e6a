use crate::{Aabb, Vec3};

/// Half-space given as `normal · p + d >= 0` for points on the inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    #[inline]
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let n = normal.normalized();
        Self {
            normal: n,
            d: -n.dot(point),
        }
    }

    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }
}

/// Perspective view frustum: six inward-facing planes.
///
/// Equality compares the raw planes, which is exactly what the occlusion
/// graph needs to detect "the frustum actually changed" between frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
    pub origin: Vec3,
}

impl Frustum {
    /// Build from a camera pose. `fov_y_deg` is the vertical field of view.
    pub fn perspective(
        position: Vec3,
        forward: Vec3,
        up_hint: Vec3,
        fov_y_deg: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let fwd = forward.normalized();
        let right = fwd.cross(up_hint).normalized();
        let up = right.cross(fwd).normalized();

        let half_v = (fov_y_deg.to_radians() * 0.5).tan();
        let half_h = half_v * aspect;

        let near_plane = Plane::from_point_normal(position + fwd * near, fwd);
        let far_plane = Plane::from_point_normal(position + fwd * far, -fwd);

        // Side planes pass through the camera position; normals tilt inward.
        let right_n = up.cross((fwd + right * half_h).normalized());
        let left_n = (fwd - right * half_h).normalized().cross(up);
        let top_n = (fwd + up * half_v).normalized().cross(right);
        let bottom_n = right.cross((fwd - up * half_v).normalized());

        Self {
            planes: [
                near_plane,
                far_plane,
                Plane::from_point_normal(position, left_n),
                Plane::from_point_normal(position, right_n),
                Plane::from_point_normal(position, top_n),
                Plane::from_point_normal(position, bottom_n),
            ],
            origin: position,
        }
    }

    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.planes.iter().all(|pl| pl.signed_distance(p) >= 0.0)
    }

    /// Conservative AABB test: true when the box is fully or partially inside.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for pl in &self.planes {
            if pl.signed_distance(aabb.far_corner(pl.normal)) < 0.0 {
                return false;
            }
        }
        true
    }
}
