//! Ground-patch geometry and field-of-view estimation.
//!
//! The world is a flat ground plane at y = 0 with +x north and +z east.
//! A rectangular patch on that plane models the footprint seen by a
//! downward-facing camera; the camera itself hovers over the patch
//! centroid. FOV estimates are recovered purely from the corner
//! geometry, the same way a mapping pipeline would recover them from
//! known ground control points.

use glam::DVec3;

/// Axis-aligned rectangle on the ground plane.
///
/// Edges are signed plane coordinates, not widths: `up`/`down` are
/// x-values of the far/near edges, `left`/`right` are z-values of the
/// west/east edges. Edges are free to cross; a degenerate or inverted
/// patch is legal editor state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPatch {
    /// Far edge x-coordinate (meters, +x)
    pub up: f64,
    /// Near edge x-coordinate (meters, -x)
    pub down: f64,
    /// West edge z-coordinate (meters, -z)
    pub left: f64,
    /// East edge z-coordinate (meters, +z)
    pub right: f64,
}

impl GroundPatch {
    pub fn new(up: f64, down: f64, left: f64, right: f64) -> Self {
        Self {
            up,
            down,
            left,
            right,
        }
    }

    /// Corner positions in fixed winding order:
    /// up-left, up-right, down-right, down-left.
    ///
    /// Adjacent pairs share an edge, so `corners[0] - corners[1]` spans
    /// the patch width and `corners[2] - corners[1]` spans its depth.
    pub fn corners(&self) -> [DVec3; 4] {
        [
            DVec3::new(self.up, 0.0, self.left),
            DVec3::new(self.up, 0.0, self.right),
            DVec3::new(self.down, 0.0, self.right),
            DVec3::new(self.down, 0.0, self.left),
        ]
    }

    /// Arithmetic mean of the four corners (always on the ground plane).
    pub fn centroid(&self) -> DVec3 {
        let [p1, p2, p3, p4] = self.corners();
        (p1 + p2 + p3 + p4) / 4.0
    }

    /// Camera position: directly above the centroid at the given height.
    pub fn camera_position(&self, height_m: f64) -> DVec3 {
        let c = self.centroid();
        DVec3::new(c.x, height_m, c.z)
    }
}

/// Estimated field of view recovered from corner vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovEstimate {
    /// Angle subtended by the patch width (degrees)
    pub horizontal_deg: f64,
    /// Angle subtended by the patch depth (degrees)
    pub vertical_deg: f64,
}

/// Vectors from the camera to each patch corner, in corner order.
pub fn corner_vectors(camera: DVec3, corners: &[DVec3; 4]) -> [DVec3; 4] {
    [
        corners[0] - camera,
        corners[1] - camera,
        corners[2] - camera,
        corners[3] - camera,
    ]
}

/// Angle between two vectors (degrees).
///
/// No domain clamping: a zero-length input or a dot product pushed
/// outside [-1, 1] by rounding yields NaN, and NaN is the honest
/// answer for a degenerate patch. Callers display it as-is.
pub fn angle_between_deg(a: DVec3, b: DVec3) -> f64 {
    (a.dot(b) / (a.length() * b.length())).acos().to_degrees()
}

/// FOV from the camera-to-corner vectors.
///
/// Horizontal spans the up edge (up-left to up-right), vertical spans
/// the right edge (up-right to down-right).
pub fn estimate_fov(vectors: &[DVec3; 4]) -> FovEstimate {
    FovEstimate {
        horizontal_deg: angle_between_deg(vectors[0], vectors[1]),
        vertical_deg: angle_between_deg(vectors[1], vectors[2]),
    }
}
