//! Sampling primitives required by §4.A: concentric disk sampling (for the
//! lens and the cosine-weighted hemisphere), cosine-weighted hemisphere
//! sampling with its exact pdf, GGX visible-normal sampling, uniform
//! triangle sampling, and the area<->solid-angle pdf conversion.
//!
//! `concentric_sample_disk` is carried over from the teacher's
//! `sampling::concentric_sample_disk` almost verbatim (same mapping, same
//! degenerate-origin special case); the rest is new, grounded on
//! `bxdf::torrance_sparrow` for the shape of a microfacet sampler.

use super::vec3::{basis_from_normal, dot, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Map two uniform randoms in `[0,1)^2` to a point on the unit disk with
/// Shirley's concentric mapping (low-distortion vs. naive polar mapping).
pub fn concentric_sample_disk(u: (f32, f32)) -> (f32, f32) {
    let ox = 2.0 * u.0 - 1.0;
    let oy = 2.0 * u.1 - 1.0;
    if ox == 0.0 && oy == 0.0 {
        return (0.0, 0.0);
    }
    let (r, theta) = if ox.abs() > oy.abs() {
        (ox, FRAC_PI_4 * (oy / ox))
    } else {
        (oy, FRAC_PI_2 - FRAC_PI_4 * (ox / oy))
    };
    (r * theta.cos(), r * theta.sin())
}

/// Cosine-weighted direction in the hemisphere around `+z`, with its exact
/// pdf `cos(theta) / pi` returned alongside it.
pub fn cosine_sample_hemisphere(u: (f32, f32)) -> (Vec3, f32) {
    let (x, y) = concentric_sample_disk(u);
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();
    (Vec3::new(x, y, z), z * std::f32::consts::FRAC_1_PI)
}

pub fn cosine_hemisphere_pdf(cos_theta: f32) -> f32 {
    cos_theta.max(0.0) * std::f32::consts::FRAC_1_PI
}

/// GGX normal distribution function D(h) for roughness `alpha` (already
/// squared perceptual roughness, i.e. `alpha = roughness^2`).
pub fn ggx_d(n_dot_h: f32, alpha: f32) -> f32 {
    let a2 = alpha * alpha;
    let d = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * d * d).max(1e-12)
}

/// Smith masking-shadowing term for GGX, combined (Heitz 2014, the uncorrelated
/// height form used by Torrance-Sparrow-style BRDFs).
pub fn ggx_g(n_dot_v: f32, n_dot_l: f32, alpha: f32) -> f32 {
    let a2 = alpha * alpha;
    let g1 = |n_dot_x: f32| {
        let cos2 = n_dot_x * n_dot_x;
        let tan2 = (1.0 - cos2).max(0.0) / cos2.max(1e-12);
        2.0 / (1.0 + (1.0 + a2 * tan2).sqrt())
    };
    g1(n_dot_v.abs()) * g1(n_dot_l.abs())
}

/// Sample a microfacet normal from the GGX visible-normal distribution
/// (Heitz 2018), in the local frame where `n = +z` and `w_o` points away
/// from the surface. Returns the sampled half-vector `h`.
pub fn sample_ggx_vndf(w_o_local: Vec3, alpha: f32, u: (f32, f32)) -> Vec3 {
    // Stretch the view vector so the ellipsoid becomes a hemisphere.
    let v = Vec3::new(w_o_local.x * alpha, w_o_local.y * alpha, w_o_local.z).normalized();
    let (t1_unnorm, _) = basis_from_normal(v);
    let t1 = if v.z < 0.9999 {
        super::vec3::cross(Vec3::new(0.0, 0.0, 1.0), v).normalized()
    } else {
        t1_unnorm
    };
    let t2 = super::vec3::cross(v, t1);

    let r = u.0.sqrt();
    let phi = 2.0 * PI * u.1;
    let p1 = r * phi.cos();
    let mut p2 = r * phi.sin();
    let s = 0.5 * (1.0 + v.z);
    p2 = (1.0 - s) * (1.0 - p1 * p1).max(0.0).sqrt() + s * p2;

    let n_h = Vec3::new(p1, p2, (1.0 - p1 * p1 - p2 * p2).max(0.0).sqrt());
    let n_stretched = t1 * n_h.x + t2 * n_h.y + v * n_h.z;
    Vec3::new(
        n_stretched.x * alpha,
        n_stretched.y * alpha,
        n_stretched.z.max(1e-6),
    )
    .normalized()
}

/// pdf of the half-vector returned by `sample_ggx_vndf`, expressed in
/// half-vector (not incident-direction) measure: `D(h) * G1(wo) * |wo.h| / |wo.n|`.
pub fn ggx_vndf_pdf(w_o_local: Vec3, h: Vec3, alpha: f32) -> f32 {
    let n_dot_v = w_o_local.z;
    if n_dot_v <= 0.0 {
        return 0.0;
    }
    let g1 = {
        let a2 = alpha * alpha;
        let cos2 = n_dot_v * n_dot_v;
        let tan2 = (1.0 - cos2).max(0.0) / cos2.max(1e-12);
        2.0 / (1.0 + (1.0 + a2 * tan2).sqrt())
    };
    let d = ggx_d(h.z.max(0.0), alpha);
    (d * g1 * dot(w_o_local, h).abs() / n_dot_v).max(0.0)
}

/// Uniform point on the unit sphere, carried over from the teacher's
/// `sampling::uniform_sample_sphere` (area-light sampling for `SPHERE`
/// geoms, §4.E.2).
pub fn uniform_sample_sphere(u: (f32, f32)) -> Vec3 {
    let z = 1.0 - 2.0 * u.0;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.1;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniformly sample a point on a triangle via the standard sqrt-mapping,
/// returning barycentric coordinates `(b0, b1)` with `b2 = 1 - b0 - b1`.
pub fn uniform_sample_triangle(u: (f32, f32)) -> (f32, f32) {
    let su0 = u.0.sqrt();
    (1.0 - su0, u.1 * su0)
}

/// Convert a pdf expressed over the light's surface area to one expressed
/// over solid angle at the shading point: `pdf_w = pdf_A * d^2 / |cos(theta_l)|`.
pub fn area_pdf_to_solid_angle(pdf_area: f32, dist_sqr: f32, cos_theta_light: f32) -> f32 {
    if cos_theta_light.abs() < 1e-8 {
        0.0
    } else {
        pdf_area * dist_sqr / cos_theta_light.abs()
    }
}

/// The power heuristic (Veach), `beta = 2`, used to combine the light- and
/// BSDF-sampling MIS terms (§4.E.4).
pub fn power_heuristic(n_f: f32, pdf_f: f32, n_g: f32, pdf_g: f32) -> f32 {
    let f = n_f * pdf_f;
    let g = n_g * pdf_g;
    if f == 0.0 && g == 0.0 {
        return 0.0;
    }
    (f * f) / (f * f + g * g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_hemisphere_pdf_matches_formula() {
        let (w, pdf) = cosine_sample_hemisphere((0.3, 0.9));
        assert!((pdf - cosine_hemisphere_pdf(w.z)).abs() < 1e-6);
        assert!(w.z >= 0.0);
    }

    #[test]
    fn power_heuristic_weights_sum_to_one() {
        let pdf_light = 2.3;
        let pdf_bsdf = 0.7;
        let w_light = power_heuristic(1.0, pdf_light, 1.0, pdf_bsdf);
        let w_bsdf = power_heuristic(1.0, pdf_bsdf, 1.0, pdf_light);
        assert!((w_light + w_bsdf - 1.0).abs() < 1e-5);
    }

    #[test]
    fn concentric_disk_stays_in_unit_disk() {
        for i in 0..50 {
            let u = (i as f32 / 50.0, (i * 7 % 50) as f32 / 50.0);
            let (x, y) = concentric_sample_disk(u);
            assert!(x * x + y * y <= 1.0001);
        }
    }
}
