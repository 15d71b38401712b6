//! Local-plane to geographic coordinate projection.
//!
//! The simulation runs in a flat local frame; geographic readouts come
//! from an equirectangular projection around a reference point. Good to
//! well under a meter at patch scale, which is all a simulated GPS
//! readout needs.

/// Meters per degree of latitude (spherical earth, 40030 km meridian).
pub const METERS_PER_DEGREE: f64 = 111_194.4444;

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoord {
    /// Latitude (degrees, +north)
    pub lat_deg: f64,
    /// Longitude (degrees, +east)
    pub lon_deg: f64,
}

impl GeoCoord {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }
}

/// Project a planar offset from a reference point into geographic
/// coordinates.
///
/// `dx_m` runs north (scene +x), `dz_m` runs east (scene +z). One
/// degree of longitude shrinks by cos(latitude), so the east offset is
/// divided by it; the reference latitude stands in for the local
/// latitude, which is exact enough at patch scale.
pub fn project_offset(reference: GeoCoord, dx_m: f64, dz_m: f64) -> GeoCoord {
    let meters_per_lon_degree = METERS_PER_DEGREE * reference.lat_deg.to_radians().cos();
    GeoCoord {
        lat_deg: reference.lat_deg + dx_m / METERS_PER_DEGREE,
        lon_deg: reference.lon_deg + dz_m / meters_per_lon_degree,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_offset_is_identity() {
        let origin = GeoCoord::new(51.423867, -2.671733);
        let projected = project_offset(origin, 0.0, 0.0);
        assert_eq!(projected, origin);
    }

    #[test]
    fn test_one_degree_of_latitude_north() {
        let origin = GeoCoord::new(10.0, 20.0);
        let projected = project_offset(origin, METERS_PER_DEGREE, 0.0);

        assert!((projected.lat_deg - 11.0).abs() < 1e-12);
        assert_eq!(projected.lon_deg, 20.0);
    }

    #[test]
    fn test_longitude_stretches_with_latitude() {
        // At 60°N a degree of longitude is half as long as at the
        // equator, so the same east offset moves twice as many degrees.
        let equator = project_offset(GeoCoord::new(0.0, 0.0), 0.0, 1000.0);
        let north = project_offset(GeoCoord::new(60.0, 0.0), 0.0, 1000.0);

        let ratio = (north.lon_deg - 0.0) / (equator.lon_deg - 0.0);
        assert!((ratio - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_offsets_go_south_west() {
        let origin = GeoCoord::new(51.0, -2.0);
        let projected = project_offset(origin, -500.0, -500.0);

        assert!(projected.lat_deg < origin.lat_deg);
        assert!(projected.lon_deg < origin.lon_deg);
    }
}
