//! Material & BSDF (§4.D). A flat tagged enum dispatched by `match`
//! rather than the teacher's arena-allocated, `enum_dispatch`-composed
//! `Material`/`BxDFs` stack (`material::mod`, `bxdf::mod`): this engine
//! never composes more than one lobe per hit, so the arena and the
//! multi-`BxDF` slice it built per intersection buy nothing here. The
//! tagged-enum *idiom* itself is still the teacher's own
//! (`geometry::BoundableGeometry`, `material::Materials`) — only the
//! composition machinery is dropped.

pub mod fresnel;
pub mod microfacet;

use crate::color::Color;
use crate::math::{basis_from_normal, cosine_sample_hemisphere, dot, next_2d, reflect, refract, SmallRng};

#[cfg(feature = "sub_scattering")]
use crate::medium::Medium;

#[derive(Debug, Clone, Copy)]
pub enum Material {
    Diffuse { albedo: Color },
    SpecReflect { specular: Color },
    SpecTransmit {
        specular: Color,
        ior: f32,
        #[cfg(feature = "sub_scattering")]
        medium: Option<Medium>,
    },
    SpecFresnel {
        specular: Color,
        ior: f32,
        #[cfg(feature = "sub_scattering")]
        medium: Option<Medium>,
    },
    Microfacet { albedo: Color, roughness: f32, ior: f32 },
    Emissive { emittance: Color },
}

impl Material {
    pub fn is_emissive(&self) -> bool {
        matches!(self, Material::Emissive { .. })
    }

    pub fn is_specular(&self) -> bool {
        matches!(
            self,
            Material::SpecReflect { .. } | Material::SpecTransmit { .. } | Material::SpecFresnel { .. }
        )
    }

    pub fn emitted(&self) -> Color {
        match self {
            Material::Emissive { emittance } => *emittance,
            _ => Color::BLACK,
        }
    }

    /// §9 design note: the medium a path entering this interface should
    /// carry from here on, if any.
    #[cfg(feature = "sub_scattering")]
    pub fn carried_medium(&self) -> Option<Medium> {
        match *self {
            Material::SpecTransmit { medium, .. } => medium,
            Material::SpecFresnel { medium, .. } => medium,
            _ => None,
        }
    }
}

/// Outcome of a single `scatter` call (§4.D): either the path continues in
/// a new direction with an updated throughput, or it hit a degenerate
/// condition (wrong hemisphere, zero pdf) and must terminate — per §7
/// these are not `Result` errors, just a `None`.
pub struct ScatterResult {
    pub new_origin: crate::math::Vec3,
    pub new_dir: crate::math::Vec3,
    pub throughput_factor: Color,
    pub specular_bounce: bool,
    /// §9 design note: the medium the continuing path should carry, set
    /// whenever this scatter event crossed a `SpecTransmit`/`SpecFresnel`
    /// interface. `None` for every other material and for a
    /// total-internal-reflection fallback (the ray never crossed the
    /// interface).
    #[cfg(feature = "sub_scattering")]
    pub attached_medium: Option<Medium>,
}

/// `scatter(pathSegment, hitPoint, normal, tangent, material, rng)`: samples
/// a new direction and returns the throughput multiplier `f * |cos θ| /
/// pdf`. Returns `None` when the sampled direction is degenerate (wrong
/// hemisphere or zero pdf), signaling the caller to terminate the path
/// (`remainingBounces = 0`) rather than treat it as an error.
pub fn scatter(
    hit_point: crate::math::Vec3,
    normal: crate::math::Vec3,
    wo: crate::math::Vec3,
    material: &Material,
    rng: &mut SmallRng,
) -> Option<ScatterResult> {
    use crate::geometry::Ray;
    let (tangent, bitangent) = basis_from_normal(normal);
    let to_world = |local: crate::math::Vec3| tangent * local.x + bitangent * local.y + normal * local.z;
    let wo_local = crate::math::Vec3::new(dot(wo, tangent), dot(wo, bitangent), dot(wo, normal));

    match *material {
        Material::Diffuse { albedo } => {
            let (local_dir, pdf) = cosine_sample_hemisphere(next_2d(rng));
            if pdf <= 0.0 {
                return None;
            }
            let wi = to_world(local_dir);
            Some(ScatterResult {
                new_origin: Ray::spawn(hit_point, wi, normal).o,
                new_dir: wi,
                throughput_factor: albedo,
                specular_bounce: false,
                #[cfg(feature = "sub_scattering")]
                attached_medium: None,
            })
        }
        Material::SpecReflect { specular } => {
            let wi = reflect(wo, normal);
            if dot(wi, normal) <= 0.0 {
                return None;
            }
            Some(ScatterResult {
                new_origin: Ray::spawn(hit_point, wi, normal).o,
                new_dir: wi,
                throughput_factor: specular,
                specular_bounce: true,
                #[cfg(feature = "sub_scattering")]
                attached_medium: None,
            })
        }
        Material::SpecTransmit { specular, ior, .. } => {
            let entering = wo_local.z > 0.0;
            let n = if entering { normal } else { -normal };
            let eta = if entering { 1.0 / ior } else { ior };
            match refract(wo, n, eta) {
                Some(wi) => Some(ScatterResult {
                    new_origin: Ray::spawn(hit_point, wi, -n).o,
                    new_dir: wi,
                    throughput_factor: specular,
                    specular_bounce: true,
                    #[cfg(feature = "sub_scattering")]
                    attached_medium: material.carried_medium(),
                }),
                None => {
                    // total internal reflection: fall back to the mirror branch.
                    let wi = reflect(wo, normal);
                    if dot(wi, normal) <= 0.0 {
                        return None;
                    }
                    Some(ScatterResult {
                        new_origin: Ray::spawn(hit_point, wi, normal).o,
                        new_dir: wi,
                        throughput_factor: specular,
                        specular_bounce: true,
                        #[cfg(feature = "sub_scattering")]
                        attached_medium: None,
                    })
                }
            }
        }
        Material::SpecFresnel { specular, ior, .. } => {
            let entering = wo_local.z > 0.0;
            let (eta_i, eta_t) = if entering { (1.0, ior) } else { (ior, 1.0) };
            let fr = fresnel::dielectric(wo_local.z, eta_i, eta_t);
            if next_f32_local(rng) < fr {
                let wi = reflect(wo, normal);
                if dot(wi, normal) <= 0.0 {
                    return None;
                }
                Some(ScatterResult {
                    new_origin: Ray::spawn(hit_point, wi, normal).o,
                    new_dir: wi,
                    throughput_factor: specular,
                    specular_bounce: true,
                    #[cfg(feature = "sub_scattering")]
                    attached_medium: None,
                })
            } else {
                let n = if entering { normal } else { -normal };
                let eta = if entering { 1.0 / ior } else { ior };
                let wi = refract(wo, n, eta)?;
                Some(ScatterResult {
                    new_origin: Ray::spawn(hit_point, wi, -n).o,
                    new_dir: wi,
                    throughput_factor: specular,
                    specular_bounce: true,
                    #[cfg(feature = "sub_scattering")]
                    attached_medium: material.carried_medium(),
                })
            }
        }
        Material::Microfacet { albedo, roughness, ior } => {
            let alpha = microfacet::roughness_to_alpha(roughness);
            if wo_local.z <= 0.0 {
                return None;
            }
            let h_local = crate::math::sample_ggx_vndf(wo_local, alpha, next_2d(rng));
            let wi_local = crate::math::reflect(wo_local, h_local);
            if wi_local.z <= 0.0 {
                return None;
            }
            let pdf_h = crate::math::ggx_vndf_pdf(wo_local, h_local, alpha);
            let pdf = pdf_h / (4.0 * dot(wo_local, h_local).abs()).max(1e-8);
            if pdf <= 0.0 {
                return None;
            }
            let n_dot_v = wo_local.z;
            let n_dot_l = wi_local.z;
            let n_dot_h = h_local.z.max(0.0);
            let f0 = ((ior - 1.0) / (ior + 1.0)).powi(2);
            let f = fresnel::schlick(dot(wo_local, h_local).abs(), f0);
            let d = crate::math::ggx_d(n_dot_h, alpha);
            let g = crate::math::ggx_g(n_dot_v, n_dot_l, alpha);
            let brdf = (f * d * g) / (4.0 * n_dot_v * n_dot_l).max(1e-8);
            let wi = to_world(wi_local);
            Some(ScatterResult {
                new_origin: Ray::spawn(hit_point, wi, normal).o,
                new_dir: wi,
                throughput_factor: albedo * (brdf * n_dot_l / pdf),
                specular_bounce: false,
                #[cfg(feature = "sub_scattering")]
                attached_medium: None,
            })
        }
        Material::Emissive { .. } => None,
    }
}

fn next_f32_local(rng: &mut SmallRng) -> f32 {
    crate::math::next_f32(rng)
}

/// `f_s(wo, wi)`: BSDF value for the light-sampling MIS term (§4.E.2).
/// Specular materials have a zero-measure BSDF and always return black —
/// direct lighting on them is deferred to the next bounce (§4.E, last
/// paragraph).
pub fn bsdf_eval(material: &Material, normal: crate::math::Vec3, wo: crate::math::Vec3, wi: crate::math::Vec3) -> Color {
    match *material {
        Material::Diffuse { albedo } => {
            if dot(wi, normal) > 0.0 && dot(wo, normal) > 0.0 {
                albedo * std::f32::consts::FRAC_1_PI
            } else {
                Color::BLACK
            }
        }
        Material::Microfacet { albedo, roughness, ior } => {
            let n_dot_v = dot(wo, normal);
            let n_dot_l = dot(wi, normal);
            if n_dot_v <= 0.0 || n_dot_l <= 0.0 {
                return Color::BLACK;
            }
            let h = (wo + wi).normalized();
            let alpha = microfacet::roughness_to_alpha(roughness);
            let n_dot_h = dot(normal, h).max(0.0);
            let f0 = ((ior - 1.0) / (ior + 1.0)).powi(2);
            let f = fresnel::schlick(dot(wo, h).max(0.0), f0);
            let d = crate::math::ggx_d(n_dot_h, alpha);
            let g = crate::math::ggx_g(n_dot_v, n_dot_l, alpha);
            albedo * ((f * d * g) / (4.0 * n_dot_v * n_dot_l).max(1e-8))
        }
        _ => Color::BLACK,
    }
}

/// pdf of sampling `wi` via `scatter` from `wo` (§4.E.3/4, the BSDF-sampling
/// term's denominator). Specular materials have a delta pdf; reported as 0
/// since MIS never mixes them (they skip MIS entirely per §4.E).
pub fn bsdf_pdf(material: &Material, normal: crate::math::Vec3, wo: crate::math::Vec3, wi: crate::math::Vec3) -> f32 {
    match *material {
        Material::Diffuse { .. } => crate::math::cosine_hemisphere_pdf(dot(wi, normal)),
        Material::Microfacet { roughness, .. } => {
            let n_dot_v = dot(wo, normal);
            if n_dot_v <= 0.0 {
                return 0.0;
            }
            let alpha = microfacet::roughness_to_alpha(roughness);
            let h = (wo + wi).normalized();
            let (tangent, bitangent) = basis_from_normal(normal);
            let wo_local = crate::math::Vec3::new(dot(wo, tangent), dot(wo, bitangent), dot(wo, normal));
            let h_local = crate::math::Vec3::new(dot(h, tangent), dot(h, bitangent), dot(h, normal));
            let pdf_h = crate::math::ggx_vndf_pdf(wo_local, h_local, alpha);
            pdf_h / (4.0 * dot(wo, h).abs()).max(1e-8)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{seeded_rng, Vec3};

    #[test]
    fn diffuse_scatter_stays_in_hemisphere() {
        let mut rng = seeded_rng(0, 0, 0);
        let normal = Vec3::new(0.0, 1.0, 0.0);
        let wo = Vec3::new(0.0, 1.0, 0.0);
        let mat = Material::Diffuse { albedo: Color::new(0.5, 0.5, 0.5) };
        let result = scatter(Vec3::ZERO, normal, wo, &mat, &mut rng).expect("should scatter");
        assert!(dot(result.new_dir, normal) > 0.0);
    }

    #[test]
    fn mirror_reflects_about_normal() {
        let mut rng = seeded_rng(0, 0, 0);
        let normal = Vec3::new(0.0, 1.0, 0.0);
        let wo = Vec3::new(0.3, 0.7, 0.0).normalized();
        let mat = Material::SpecReflect { specular: Color::WHITE };
        let result = scatter(Vec3::ZERO, normal, wo, &mat, &mut rng).expect("should scatter");
        assert!(result.specular_bounce);
        let expected = crate::math::reflect(wo, normal);
        assert!((result.new_dir - expected).length() < 1e-5);
    }

    #[test]
    fn diffuse_bsdf_eval_matches_albedo_over_pi() {
        let normal = Vec3::new(0.0, 1.0, 0.0);
        let wo = Vec3::new(0.0, 1.0, 0.0);
        let wi = Vec3::new(0.0, 1.0, 0.0);
        let mat = Material::Diffuse { albedo: Color::new(0.8, 0.4, 0.2) };
        let f = bsdf_eval(&mat, normal, wo, wi);
        assert!((f.r - 0.8 / std::f32::consts::PI).abs() < 1e-5);
    }
}
