//! Fresnel terms, carried over from the teacher's `bxdf::fresnel`: the
//! full dielectric formula (used by `SPEC_FRESNEL`/`SPEC_TRANS`) and the
//! Schlick approximation (cheaper, used by `MICROFACET` where the exact
//! conductor form isn't worth the extra trig per sample).

/// Exact unpolarized Fresnel reflectance for a dielectric interface, the
/// same `r_par`/`r_perp` derivation as the teacher's
/// `Dielectric::evaluate`, including the `eta_i`/`eta_t` swap and total
/// internal reflection when `sin_t >= 1`.
pub fn dielectric(cos_theta_i: f32, eta_i: f32, eta_t: f32) -> f32 {
    let cos_i = cos_theta_i.clamp(-1.0, 1.0);
    let (eta_i, eta_t, cos_i) = if cos_i > 0.0 {
        (eta_i, eta_t, cos_i)
    } else {
        (eta_t, eta_i, -cos_i)
    };

    let sin_i = (1.0 - cos_i * cos_i).max(0.0).sqrt();
    let sin_t = eta_i / eta_t * sin_i;
    if sin_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();

    let r_par = ((eta_t * cos_i) - (eta_i * cos_t)) / ((eta_t * cos_i) + (eta_i * cos_t));
    let r_perp = ((eta_i * cos_i) - (eta_t * cos_t)) / ((eta_i * cos_i) + (eta_t * cos_t));
    0.5 * (r_par * r_par + r_perp * r_perp)
}

/// Schlick's approximation, used where `SPEC_FRESNEL` picks reflect-vs-
/// refract probability and where `MICROFACET` weights its `F` term.
pub fn schlick(cos_theta: f32, f0: f32) -> f32 {
    let m = (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5);
    f0 + (1.0 - f0) * m
}
