use vantage_geom::{Frustum, Vec3};

pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,   // degrees
    pub pitch: f32, // degrees
    pub fov_y_deg: f32,
    pub move_speed: f32,
}

impl FlyCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: -45.0,
            pitch: -15.0,
            fov_y_deg: 70.0,
            move_speed: 8.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let yaw_rad = self.yaw.to_radians();
        let pitch_rad = self.pitch.to_radians();
        Vec3::new(
            yaw_rad.cos() * pitch_rad.cos(),
            pitch_rad.sin(),
            yaw_rad.sin() * pitch_rad.cos(),
        )
        .normalized()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::UP).normalized()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalized()
    }

    pub fn frustum(&self, aspect: f32) -> Frustum {
        Frustum::perspective(
            self.position,
            self.forward(),
            Vec3::UP,
            self.fov_y_deg,
            aspect,
            0.1,
            4096.0,
        )
    }
}

/// One stop on a scripted flight: where to stand and where to look.
#[derive(Clone, Copy, Debug)]
pub struct Waypoint {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

/// Deterministic camera driver for headless runs: flies the camera through
/// the waypoints at the camera's move speed, interpolating yaw and pitch,
/// and holds the last pose when the route is done.
pub struct CameraScript {
    waypoints: Vec<Waypoint>,
    next: usize,
}

impl CameraScript {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints, next: 0 }
    }

    pub fn finished(&self) -> bool {
        self.next >= self.waypoints.len()
    }

    pub fn advance(&mut self, cam: &mut FlyCamera, dt: f32) {
        let Some(target) = self.waypoints.get(self.next).copied() else {
            return;
        };
        let to_target = target.position - cam.position;
        let dist = to_target.length();
        let step = cam.move_speed * dt.max(0.0);
        if dist <= step || dist <= f32::EPSILON {
            cam.position = target.position;
            cam.yaw = target.yaw;
            cam.pitch = target.pitch;
            self.next += 1;
            return;
        }
        let t = step / dist;
        cam.position = cam.position + to_target * t;
        cam.yaw += (target.yaw - cam.yaw) * t;
        cam.pitch += (target.pitch - cam.pitch) * t;
    }
}
