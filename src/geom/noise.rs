//! Cell noise: one pseudo-random value per unit lattice cell.

use super::core::{Point3, Vec3};

const CHANNEL_SEEDS: [u32; 3] = [0, 0x9E37_79B9, 0x85EB_CA6B];

/// Value in `[0, 1)` that is constant inside each unit cell.
#[must_use]
pub fn cell_noise(p: Point3) -> f64 {
    unit_hash(p, CHANNEL_SEEDS[0])
}

/// Three decorrelated channels in `[-1, 1]`, constant inside each unit cell.
#[must_use]
pub fn cell_noise_vector(p: Point3) -> Vec3 {
    let [a, b, c] = CHANNEL_SEEDS.map(|seed| unit_hash(p, seed) * 2.0 - 1.0);
    Vec3::new(a, b, c)
}

fn unit_hash(p: Point3, seed: u32) -> f64 {
    let cell = |v: f64| -> i32 {
        if v.is_finite() {
            v.floor() as i32
        } else {
            0
        }
    };
    let n = lattice_hash(cell(p.x), cell(p.y), cell(p.z), seed);
    f64::from(n) / (f64::from(u32::MAX) + 1.0)
}

fn lattice_hash(x: i32, y: i32, z: i32, seed: u32) -> u32 {
    let mut n = x
        .wrapping_mul(374_761_393)
        .wrapping_add(y.wrapping_mul(668_265_263))
        .wrapping_add(z.wrapping_mul(1_274_126_177))
        .wrapping_add(seed as i32);
    n ^= n >> 13;
    n = n.wrapping_mul(
        n.wrapping_mul(n.wrapping_mul(60_493).wrapping_add(19_990_303))
            .wrapping_add(1_376_312_589),
    );
    n as u32
}
