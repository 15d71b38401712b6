//! Rendering configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view of the observer camera (degrees)
    pub fov_y_degrees: f32,

    /// Projection aspect ratio, fixed regardless of window size
    pub aspect_ratio: f32,

    /// Near clipping plane (meters)
    pub near_plane_m: f32,

    /// Far clipping plane (meters)
    pub far_plane_m: f32,

    /// Observer eye position (meters)
    pub observer_eye_m: [f32; 3],

    /// Point the observer looks at (meters)
    pub observer_target_m: [f32; 3],

    /// Distance of the cardinal direction markers from the origin (meters)
    pub horizon_extent_m: f32,

    /// Side length of square point markers (pixels)
    pub marker_size_px: f32,

    /// Integer upscale factor for the 8x8 HUD font
    pub glyph_scale: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_y_degrees: 60.0,
            aspect_ratio: 16.0 / 9.0,
            near_plane_m: 0.01,
            far_plane_m: 400.0,
            // Elevated three-quarter view of the patch from the south-west
            observer_eye_m: [-80.0, 120.0, -80.0],
            observer_target_m: [8.110778, 0.0, -39.169060],
            horizon_extent_m: 70.0,
            marker_size_px: 6.0,
            glyph_scale: 2,
        }
    }
}
