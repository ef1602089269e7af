//! Small helpers around the GGX math in `crate::math::sampling`, split out
//! of `material::scatter`/`bsdf_eval` so the roughness-to-alpha convention
//! lives in one place. Grounded on the teacher's
//! `bxdf::torrance_sparrow::TorranceSparrow`, which keeps the same
//! separation between the microfacet distribution and the BRDF that uses
//! it.

/// Perceptual roughness (`[0,1]`, artist-facing) to the `alpha` parameter
/// GGX's `D`/`G` terms expect, the common `alpha = roughness^2` remap.
pub fn roughness_to_alpha(roughness: f32) -> f32 {
    (roughness * roughness).max(1e-4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_roughness_clamped_away_from_mirror() {
        // A perfectly smooth microfacet surface degenerates to a delta
        // distribution; clamp alpha above zero so D/G stay finite and the
        // surface should use SPEC_REFL instead for true mirrors.
        assert!(roughness_to_alpha(0.0) > 0.0);
    }

    #[test]
    fn alpha_increases_with_roughness() {
        assert!(roughness_to_alpha(0.8) > roughness_to_alpha(0.2));
    }
}
