//! PUCCH resource collision detection (spec §4.4): two grants collide
//! when they reuse the same PRB pair with cyclic shifts too close
//! together to separate after correlation, or with incompatible
//! orthogonal cover indices on the same cyclic shift.

use crate::config::pucch::PucchResourceConfig;

/// Minimum cyclic-shift separation (in units of the configured
/// `delta_shift` granularity) required for two Format 1-family resources
/// sharing a PRB pair to be distinguishable at the receiver.
const MIN_CS_SEPARATION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PucchCollision {
    pub resource_a: usize,
    pub resource_b: usize,
}

/// Scan a set of simultaneously active resources (indices correspond to
/// `resources`) for pairwise collisions on the shared PRB pair implied
/// by `n_pucch`. Returns every colliding pair.
pub fn detect_collisions(resources: &[PucchResourceConfig]) -> Vec<PucchCollision> {
    let mut collisions = Vec::new();
    for i in 0..resources.len() {
        for j in (i + 1)..resources.len() {
            if resources_collide(&resources[i], &resources[j]) {
                collisions.push(PucchCollision { resource_a: i, resource_b: j });
            }
        }
    }
    collisions
}

fn resources_collide(a: &PucchResourceConfig, b: &PucchResourceConfig) -> bool {
    if a.format != b.format {
        return false;
    }
    if a.cyclic_shift == b.cyclic_shift {
        return a.orthogonal_cover_index == b.orthogonal_cover_index;
    }
    let diff = a.cyclic_shift.abs_diff(b.cyclic_shift);
    diff < MIN_CS_SEPARATION
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::pucch::PucchFormat;

    fn resource(cs: u8, cover: u8) -> PucchResourceConfig {
        PucchResourceConfig {
            format: PucchFormat::Format1a,
            n_pucch: 0,
            cyclic_shift: cs,
            orthogonal_cover_index: cover,
            channel_selection_table: None,
        }
    }

    #[test]
    fn identical_shift_and_cover_collides() {
        let resources = vec![resource(0, 0), resource(0, 0)];
        let collisions = detect_collisions(&resources);
        assert_eq!(collisions.len(), 1);
    }

    #[test]
    fn distinct_cover_on_same_shift_does_not_collide() {
        let resources = vec![resource(0, 0), resource(0, 1)];
        assert!(detect_collisions(&resources).is_empty());
    }

    #[test]
    fn distant_shifts_do_not_collide() {
        let resources = vec![resource(0, 0), resource(5, 0)];
        assert!(detect_collisions(&resources).is_empty());
    }
}
