//! Ground-patch and editing configuration.

/// Starting values for the simulated ground patch and camera.
///
/// The patch is an axis-aligned rectangle on the ground plane (y = 0),
/// described by two +x/-x edges ("up"/"down") and two -z/+z edges
/// ("left"/"right"). The camera hovers over its centroid, looking
/// straight down.
#[derive(Debug, Clone)]
pub struct InitialState {
    /// Up edge x-coordinate (meters, +x)
    pub patch_up_m: f64,

    /// Down edge x-coordinate (meters, -x)
    pub patch_down_m: f64,

    /// Left edge z-coordinate (meters, -z)
    pub patch_left_m: f64,

    /// Right edge z-coordinate (meters, +z)
    pub patch_right_m: f64,

    /// Camera height above the ground plane (meters)
    pub camera_height_m: f64,

    /// Multiplier applied to all edit rates (dimensionless)
    pub dragging_speed: f64,

    /// Sample object vertical image position (fraction of half-height, [-1, 1])
    pub sample_vertical_pct: f64,

    /// Sample object horizontal image position (fraction of half-width, [-1, 1])
    pub sample_horizontal_pct: f64,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            patch_up_m: 30.0,
            patch_down_m: -30.0,
            patch_left_m: -30.0,
            patch_right_m: 30.0,
            camera_height_m: 50.0,
            dragging_speed: 1.0,
            sample_vertical_pct: 0.2,
            sample_horizontal_pct: -0.3,
        }
    }
}

/// Edit rates and clamp ranges for interactive state changes.
///
/// Rates are scaled by the dragging-speed multiplier and by frame
/// delta time, so holding a key drags a value at a wall-clock rate.
/// The speed factor itself is per accepted frame, not per second.
#[derive(Debug, Clone)]
pub struct EditorRates {
    /// Patch edge drag rate (meters per second at speed 1.0)
    pub edge_rate_m_per_s: f64,

    /// Camera height drag rate (meters per second at speed 1.0)
    pub height_rate_m_per_s: f64,

    /// Sample position drag rate (fraction per second at speed 1.0)
    pub sample_rate_per_s: f64,

    /// Dragging-speed growth/decay factor per accepted frame
    pub speed_factor_per_frame: f64,

    /// Camera height clamp (meters)
    pub height_range_m: (f64, f64),

    /// Dragging-speed clamp (dimensionless)
    pub speed_range: (f64, f64),

    /// Sample position clamp (fraction of image half-extent)
    pub sample_range: (f64, f64),
}

impl Default for EditorRates {
    fn default() -> Self {
        Self {
            edge_rate_m_per_s: 0.2,
            height_rate_m_per_s: 1.0,
            sample_rate_per_s: 0.1,
            speed_factor_per_frame: 1.01,
            height_range_m: (5.0, 120.0),
            speed_range: (1.0, 20.0),
            sample_range: (-1.0, 1.0),
        }
    }
}

/// Geographic coordinate of the scene origin (0, 0, 0).
///
/// All simulated positions are projected into latitude/longitude
/// relative to this point. Default is a field near Bristol, UK.
#[derive(Debug, Clone, Copy)]
pub struct GeoReference {
    /// Latitude (degrees, +north)
    pub lat_deg: f64,

    /// Longitude (degrees, +east)
    pub lon_deg: f64,
}

impl Default for GeoReference {
    fn default() -> Self {
        Self {
            lat_deg: 51.423867,
            lon_deg: -2.671733,
        }
    }
}

/// Aggregate simulation parameters.
#[derive(Debug, Clone, Default)]
pub struct SimulationParams {
    pub initial: InitialState,
    pub rates: EditorRates,
    pub geo_reference: GeoReference,
}
