// Boundary shear stress and friction velocity.
//
//   tau = gamma_w * rh * sf        u* = sqrt(g * rh * sf)
//
// Overland cells use the water depth as the hydraulic radius and the
// vector magnitude of the four axial friction slope components. Channels
// use the trapezoid-plus-cap geometry. The optional grain partition
// splits total shear into grain and bedform components for erosion.

use crate::grid::{DENSITY_WATER, GRAVITY};
use crate::hydrology::channel::ChannelGeometry;
use crate::topology::Direction;

/// Magnitude of the overland friction slope from its four axial
/// components (only the outflow components are non-zero).
pub fn overland_friction_slope(sf: &[f64; 9]) -> f64 {
    let mut sum = 0.0;
    for d in Direction::AXIAL {
        sum += sf[d.code()] * sf[d.code()];
    }
    f64::sqrt(sum)
}

/// Overland boundary shear stress (N/m2) at depth h.
pub fn overland_shear(h: f64, sf: f64) -> f64 {
    DENSITY_WATER * GRAVITY * h * sf
}

/// Overland friction velocity (m/s).
pub fn overland_friction_velocity(h: f64, sf: f64) -> f64 {
    f64::sqrt(GRAVITY * h * sf)
}

/// Hydraulics of a channel node at depth h under friction slope sf.
#[derive(Clone, Copy, Default)]
pub struct ChannelHydraulics {
    pub area: f64,             //wetted cross section (m2)
    pub wetted_perimeter: f64, //m
    pub hydraulic_radius: f64, //m
    pub tau: f64,              //boundary shear stress (N/m2)
    pub ustar: f64,            //friction velocity (m/s)
}

pub fn channel_hydraulics(geom: &ChannelGeometry, h: f64, sf: f64) -> ChannelHydraulics {
    let area = geom.cross_section_area(h);
    let wp = geom.wetted_perimeter(h);
    let rh = if wp > 0.0 { area / wp } else { 0.0 };
    let sf = sf.abs();
    ChannelHydraulics {
        area,
        wetted_perimeter: wp,
        hydraulic_radius: rh,
        tau: DENSITY_WATER * GRAVITY * rh * sf,
        ustar: f64::sqrt(GRAVITY * rh * sf),
    }
}

/// Partition total shear into its grain component. d50 is the
/// mass-weighted mean particle diameter of the bed surface (m) and h the
/// water depth (m). The bedform length bound keeps the ratio finite on
/// deep, flat beds.
pub fn grain_shear(tau: f64, d50: f64, h: f64) -> f64 {
    if h <= 0.0 {
        return tau;
    }
    let fgrain = 0.32 * libm::cbrt(d50 / h);
    let delta = 2.5 * h.powf(0.7) * d50.powf(0.3); //bedform height (m)
    let lambda = f64::min(6.5 * h, 1000.0); //bedform length (m)
    let ftaug = f64::min(fgrain / (fgrain + delta / lambda), 1.0);
    tau * ftaug
}
