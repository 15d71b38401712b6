//! HUD text overlay, rasterized on the CPU with an 8x8 bitmap font.
//!
//! Text goes into an RGBA canvas that the render system uploads as a
//! full-screen texture each frame. World-anchored labels (corner
//! names, cardinal directions) are projected here with the same
//! view-projection matrix the scene uses.

use font8x8::legacy::BASIC_LEGACY;
use glam::{DVec3, Mat4, Vec4};

use crate::params::FovTargets;
use crate::sim::{FrameSnapshot, SelectionFlags};

/// Bitmap font cell size before scaling (pixels)
pub const GLYPH_SIZE: u32 = 8;

/// Vertical lift for the cardinal direction labels (meters)
const CARDINAL_LIFT_M: f64 = 1.0;

// Text palette (straight alpha)
const ACTIVE_COLOR: [u8; 4] = [0x00, 0xFF, 0x00, 0xFF];
const IDLE_COLOR: [u8; 4] = [0x00, 0x7F, 0x00, 0xFF];
const FOV_COLOR: [u8; 4] = [0xFF, 0xA5, 0x00, 0xFF];
const SAMPLE_COLOR: [u8; 4] = [0xC2, 0x66, 0xA7, 0xFF];
const CAMERA_COLOR: [u8; 4] = [0xA0, 0xA0, 0xFF, 0xFF];
const FPS_COLOR: [u8; 4] = [0xF0, 0xF0, 0xF0, 0xFF];
const WHITE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
const NORTH_EAST_COLOR: [u8; 4] = [0x00, 0x99, 0x00, 0xFF];
const SOUTH_WEST_COLOR: [u8; 4] = [0xC8, 0x00, 0x00, 0xFF];

/// CPU-side RGBA canvas the HUD text is drawn into.
pub struct HudCanvas {
    width: u32,
    height: u32,
    scale: u32,
    pixels: Vec<u8>,
}

impl HudCanvas {
    pub fn new(width: u32, height: u32, scale: u32) -> Self {
        Self {
            width,
            height,
            scale: scale.max(1),
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; (width * height * 4) as usize];
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Width of one scaled character cell (pixels)
    pub fn cell_width(&self) -> i32 {
        (GLYPH_SIZE * self.scale) as i32
    }

    /// Row advance for stacked text lines (pixels)
    pub fn line_height(&self) -> i32 {
        (GLYPH_SIZE * self.scale + 4) as i32
    }

    /// Rendered width of a string (pixels)
    pub fn text_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * self.cell_width()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Draw `text` with its top-left corner at (x, y). Glyph pixels
    /// falling outside the canvas are clipped, so callers may anchor
    /// text at projected positions near or past the screen edge.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, color: [u8; 4]) {
        let scale = self.scale as i32;
        for (col, ch) in text.chars().enumerate() {
            let origin_x = x + col as i32 * self.cell_width();
            let glyph = glyph_for_char(ch);
            for (row, bits) in glyph.iter().enumerate() {
                for bit in 0..GLYPH_SIZE as i32 {
                    // Font rows are LSB-first: bit 0 is the leftmost pixel
                    if (bits >> bit) & 0x01 == 0 {
                        continue;
                    }
                    self.fill_block(origin_x + bit * scale, y + row as i32 * scale, color);
                }
            }
        }
    }

    fn fill_block(&mut self, x: i32, y: i32, color: [u8; 4]) {
        for dy in 0..self.scale as i32 {
            let py = y + dy;
            if py < 0 || py >= self.height as i32 {
                continue;
            }
            for dx in 0..self.scale as i32 {
                let px = x + dx;
                if px < 0 || px >= self.width as i32 {
                    continue;
                }
                let idx = ((py as u32 * self.width + px as u32) * 4) as usize;
                self.pixels[idx..idx + 4].copy_from_slice(&color);
            }
        }
    }
}

fn glyph_for_char(ch: char) -> [u8; 8] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

/// Project a world point to pixel coordinates.
///
/// Returns `None` for points at or behind the observer plane so
/// labels cannot wrap around to mirrored screen positions.
pub fn project_to_screen(
    world: DVec3,
    view_proj: Mat4,
    width: u32,
    height: u32,
) -> Option<(i32, i32)> {
    let p = world.as_vec3();
    let clip = view_proj * Vec4::new(p.x, p.y, p.z, 1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let sx = (ndc_x * 0.5 + 0.5) * width as f32;
    let sy = (0.5 - ndc_y * 0.5) * height as f32;
    Some((sx as i32, sy as i32))
}

fn selection_line(flags: &SelectionFlags) -> String {
    if flags.auto {
        return "AUTO Mode".to_string();
    }
    let mut parts = Vec::new();
    if flags.up {
        parts.push("UP");
    }
    if flags.down {
        parts.push("DOWN");
    }
    if flags.left {
        parts.push("LEFT");
    }
    if flags.right {
        parts.push("RIGHT");
    }
    if parts.is_empty() {
        "No direction".to_string()
    } else {
        format!("{} selected", parts.join(" + "))
    }
}

/// Draw the full HUD for one frame.
pub fn compose(
    canvas: &mut HudCanvas,
    snap: &FrameSnapshot,
    view_proj: Mat4,
    horizon_extent_m: f32,
    targets: FovTargets,
) {
    canvas.clear();
    let lh = canvas.line_height();
    let cell = canvas.cell_width();
    let margin = 10;

    // Selection status, top-left
    let flags = &snap.flags;
    let any_direction = flags.up || flags.down || flags.left || flags.right;
    let status_color = if flags.auto || any_direction {
        ACTIVE_COLOR
    } else {
        IDLE_COLOR
    };
    canvas.draw_text(margin, margin, &selection_line(flags), status_color);
    let (height_status, height_color) = if flags.height {
        ("Height Selected", ACTIVE_COLOR)
    } else {
        ("Height Locked", IDLE_COLOR)
    };
    canvas.draw_text(margin, margin + lh, height_status, height_color);
    let (sample_status, sample_color) = if flags.sample {
        ("Sample Selected", ACTIVE_COLOR)
    } else {
        ("Sample Locked", IDLE_COLOR)
    };
    canvas.draw_text(margin, margin + 2 * lh, sample_status, sample_color);

    // FPS, FOV and edit-speed readouts, top-right
    let right = canvas.width() as i32 - margin;
    let readouts = [
        (format!("FPS: {:6.2}", snap.fps), FPS_COLOR),
        (
            format!(
                "HFOV approx.: {:7.3} deg - Expected: {:.0} deg",
                snap.fov.horizontal_deg, targets.horizontal_deg
            ),
            FOV_COLOR,
        ),
        (
            format!(
                "VFOV approx.: {:7.3} deg - Expected: {:.0} deg",
                snap.fov.vertical_deg, targets.vertical_deg
            ),
            FOV_COLOR,
        ),
        (
            format!("Param. speed: x{:7.5}", snap.dragging_speed),
            FOV_COLOR,
        ),
    ];
    for (i, (text, color)) in readouts.iter().enumerate() {
        canvas.draw_text(
            right - canvas.text_width(text),
            margin + i as i32 * lh,
            text,
            *color,
        );
    }

    // Camera readouts under the status lines
    let mut y = margin + 3 * lh + lh / 2;
    let camera_lines = [
        format!(
            "Camera pos.: ({:8.3}, {:8.3}, {:8.3})",
            snap.camera_pos.x, snap.camera_pos.y, snap.camera_pos.z
        ),
        format!(
            "Camera geog. coords.: ({:.8}, {:.8})",
            snap.camera_geo.lat_deg, snap.camera_geo.lon_deg
        ),
        "Perspective Corner Points w.r.t Camera:".to_string(),
    ];
    for line in &camera_lines {
        canvas.draw_text(margin, y, line, CAMERA_COLOR);
        y += lh;
    }
    for (i, v) in snap.corner_vectors.iter().enumerate() {
        let line = format!("> p{} = ({:8.3}, {:8.3}, {:8.3})", i + 1, v.x, v.y, v.z);
        canvas.draw_text(margin, y, &line, CAMERA_COLOR);
        y += lh;
    }
    let aspect = format!(
        "Camera img. aspect ratio: {:.6}",
        snap.horz_span_m / snap.vert_span_m
    );
    canvas.draw_text(margin, y, &aspect, CAMERA_COLOR);
    y += lh + lh / 2;

    // Sample object estimate
    let est_planar = snap.sample_planar - snap.centroid;
    let sample_lines = [
        "Sample Object: ".to_string(),
        format!(
            "> Image Percentages (UP, RIGHT): ({:7.2}%, {:7.2}%)",
            snap.sample_vertical_pct * 100.0,
            snap.sample_horizontal_pct * 100.0
        ),
        format!(
            "> Est. Cartesian Coordinates w.r.t GMP: ({:7.3}, {:7.3}, {:7.3})",
            est_planar.x, 0.0, est_planar.z
        ),
        format!(
            "> Est. Geographical Coordinates: ({:.8}, {:.8})",
            snap.sample_geo.lat_deg, snap.sample_geo.lon_deg
        ),
    ];
    for line in &sample_lines {
        canvas.draw_text(margin, y, line, SAMPLE_COLOR);
        y += lh;
    }

    // Key help, bottom-left
    let auto_state = if flags.auto { "Enabled" } else { "Disabled" };
    let help_lines = [
        "HELP:".to_string(),
        format!("> 'A': Auto Mode ({})", auto_state),
        "> 'U': Select \"Up\" Parameter".to_string(),
        "> 'D': Select \"Down\" Parameter".to_string(),
        "> 'R': Select \"Right\" Parameter".to_string(),
        "> 'L': Select \"Left\" Parameter".to_string(),
        "> 'H': Select camera height Parameter".to_string(),
        "> ARROW_UP: Increase selected parameter".to_string(),
        "> ARROW_DOWN: Decrease selected parameter".to_string(),
        "> 'P': Select dummy camera object (Move within image using arrow keys)".to_string(),
    ];
    let help_top = canvas.height() as i32 - margin - lh * help_lines.len() as i32;
    for (i, line) in help_lines.iter().enumerate() {
        canvas.draw_text(margin, help_top + i as i32 * lh, line, WHITE);
    }

    // World-anchored labels, drawn just above their projected points
    let w = canvas.width();
    let h = canvas.height();
    for (i, corner) in snap.corners.iter().enumerate() {
        if let Some((x, y)) = project_to_screen(*corner, view_proj, w, h) {
            let label = format!("p{}", i + 1);
            canvas.draw_text(x + 4, y - cell, &label, WHITE);
        }
    }

    let ext = horizon_extent_m as f64;
    let cardinals = [
        ("N", DVec3::new(ext, CARDINAL_LIFT_M, 0.0), NORTH_EAST_COLOR),
        ("S", DVec3::new(-ext, CARDINAL_LIFT_M, 0.0), SOUTH_WEST_COLOR),
        ("E", DVec3::new(0.0, CARDINAL_LIFT_M, ext), NORTH_EAST_COLOR),
        ("W", DVec3::new(0.0, CARDINAL_LIFT_M, -ext), SOUTH_WEST_COLOR),
    ];
    for (name, pos, color) in cardinals {
        if let Some((x, y)) = project_to_screen(pos, view_proj, w, h) {
            canvas.draw_text(x - cell / 2, y - cell, name, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_project_identity_maps_origin_to_center() {
        let point = DVec3::ZERO;
        let (x, y) = project_to_screen(point, Mat4::IDENTITY, 1280, 720).unwrap();
        assert_eq!((x, y), (640, 360));
    }

    #[test]
    fn test_project_culls_points_behind_observer() {
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
        let proj = Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0);
        let view_proj = proj * view;

        assert!(project_to_screen(DVec3::new(0.0, 0.0, -10.0), view_proj, 1280, 720).is_some());
        assert!(project_to_screen(DVec3::new(0.0, 0.0, 10.0), view_proj, 1280, 720).is_none());
    }

    #[test]
    fn test_draw_text_clips_at_edges() {
        let mut canvas = HudCanvas::new(32, 16, 1);
        // Off-canvas anchors must clip, not panic or wrap
        canvas.draw_text(-5, -5, "XX", [0xFF; 4]);
        canvas.draw_text(28, 12, "wider than the canvas", [0xFF; 4]);

        let lit = canvas.pixels().iter().filter(|&&b| b != 0).count();
        assert!(lit > 0);
    }

    #[test]
    fn test_clear_resets_all_pixels() {
        let mut canvas = HudCanvas::new(16, 16, 2);
        canvas.draw_text(0, 0, "A", [0xFF; 4]);
        assert!(canvas.pixels().iter().any(|&b| b != 0));

        canvas.clear();
        assert!(canvas.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_selection_line_variants() {
        let mut flags = SelectionFlags::default();
        assert_eq!(selection_line(&flags), "No direction");

        flags.up = true;
        flags.down = true;
        assert_eq!(selection_line(&flags), "UP + DOWN selected");

        flags.auto = true;
        assert_eq!(selection_line(&flags), "AUTO Mode");
    }
}
