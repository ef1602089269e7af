//! Row-major 4x4 matrix, grounded on the teacher's `linalg::Matrix4` /
//! `transform::Transform` pair: a matrix plus its precomputed inverse, so
//! `Geom` can carry both without re-inverting per ray.

use super::vec3::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    m: [f32; 16],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub fn at(&self, i: usize, j: usize) -> f32 {
        self.m[4 * i + j]
    }

    pub fn translate(delta: Vec3) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.m[3] = delta.x;
        m.m[7] = delta.y;
        m.m[11] = delta.z;
        m
    }

    pub fn scale(s: Vec3) -> Mat4 {
        Mat4 {
            m: [
                s.x, 0.0, 0.0, 0.0, 0.0, s.y, 0.0, 0.0, 0.0, 0.0, s.z, 0.0, 0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Rotation by `angle_rad` around the unit axis `axis`.
    pub fn rotate(axis: Vec3, angle_rad: f32) -> Mat4 {
        let a = axis.normalized();
        let s = angle_rad.sin();
        let c = angle_rad.cos();
        let mut m = Mat4::IDENTITY;
        m.m[0] = a.x * a.x + (1.0 - a.x * a.x) * c;
        m.m[1] = a.x * a.y * (1.0 - c) - a.z * s;
        m.m[2] = a.x * a.z * (1.0 - c) + a.y * s;
        m.m[4] = a.x * a.y * (1.0 - c) + a.z * s;
        m.m[5] = a.y * a.y + (1.0 - a.y * a.y) * c;
        m.m[6] = a.y * a.z * (1.0 - c) - a.x * s;
        m.m[8] = a.x * a.z * (1.0 - c) - a.y * s;
        m.m[9] = a.y * a.z * (1.0 - c) + a.x * s;
        m.m[10] = a.z * a.z + (1.0 - a.z * a.z) * c;
        m
    }

    pub fn mul(&self, rhs: &Mat4) -> Mat4 {
        let mut out = [0.0; 16];
        for i in 0..4 {
            for j in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.at(i, k) * rhs.at(k, j);
                }
                out[4 * i + j] = sum;
            }
        }
        Mat4 { m: out }
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = [0.0; 16];
        for i in 0..4 {
            for j in 0..4 {
                out[4 * i + j] = self.at(j, i);
            }
        }
        Mat4 { m: out }
    }

    /// Transform a point (w = 1, perspective divide applied).
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let xp = self.at(0, 0) * p.x + self.at(0, 1) * p.y + self.at(0, 2) * p.z + self.at(0, 3);
        let yp = self.at(1, 0) * p.x + self.at(1, 1) * p.y + self.at(1, 2) * p.z + self.at(1, 3);
        let zp = self.at(2, 0) * p.x + self.at(2, 1) * p.y + self.at(2, 2) * p.z + self.at(2, 3);
        let wp = self.at(3, 0) * p.x + self.at(3, 1) * p.y + self.at(3, 2) * p.z + self.at(3, 3);
        if wp == 1.0 || wp == 0.0 {
            Vec3::new(xp, yp, zp)
        } else {
            Vec3::new(xp, yp, zp) / wp
        }
    }

    /// Transform a direction (w = 0, no translation).
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.at(0, 0) * v.x + self.at(0, 1) * v.y + self.at(0, 2) * v.z,
            self.at(1, 0) * v.x + self.at(1, 1) * v.y + self.at(1, 2) * v.z,
            self.at(2, 0) * v.x + self.at(2, 1) * v.y + self.at(2, 2) * v.z,
        )
    }

    /// Gauss-Jordan inverse (mirrors the teacher's MESA-derived cofactor
    /// inverse in spirit; used once per scene object at `init`, not per ray).
    #[must_use]
    pub fn inverse(&self) -> Mat4 {
        let mut a = self.m;
        let mut inv = Mat4::IDENTITY.m;
        for col in 0..4 {
            let mut pivot = col;
            let mut best = a[col * 4 + col].abs();
            for row in (col + 1)..4 {
                let v = a[row * 4 + col].abs();
                if v > best {
                    best = v;
                    pivot = row;
                }
            }
            assert!(best > 1e-12, "singular matrix in Mat4::inverse()");
            if pivot != col {
                for k in 0..4 {
                    a.swap(col * 4 + k, pivot * 4 + k);
                    inv.swap(col * 4 + k, pivot * 4 + k);
                }
            }
            let d = a[col * 4 + col];
            for k in 0..4 {
                a[col * 4 + k] /= d;
                inv[col * 4 + k] /= d;
            }
            for row in 0..4 {
                if row == col {
                    continue;
                }
                let f = a[row * 4 + col];
                for k in 0..4 {
                    a[row * 4 + k] -= f * a[col * 4 + k];
                    inv[row * 4 + k] -= f * inv[col * 4 + k];
                }
            }
        }
        Mat4 { m: inv }
    }
}

/// An affine transform plus its precomputed inverse, the way `Geom` stores
/// its placement (§3 Data Model): translation, rotation, non-uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub m: Mat4,
    pub inv: Mat4,
}

impl Transform {
    pub fn identity() -> Transform {
        Transform {
            m: Mat4::IDENTITY,
            inv: Mat4::IDENTITY,
        }
    }

    pub fn new(translation: Vec3, rotation_axis_angle: (Vec3, f32), scale: Vec3) -> Transform {
        let t = Mat4::translate(translation);
        let r = Mat4::rotate(rotation_axis_angle.0, rotation_axis_angle.1);
        let s = Mat4::scale(scale);
        let m = t.mul(&r).mul(&s);
        Transform { inv: m.inverse(), m }
    }

    pub fn inverse(&self) -> Transform {
        Transform {
            m: self.inv,
            inv: self.m,
        }
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.m.transform_point(p)
    }

    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.m.transform_vector(v)
    }

    /// Normals transform by the inverse-transpose, per §4.B.
    pub fn transform_normal(&self, n: Vec3) -> Vec3 {
        self.inv.transpose().transform_vector(n)
    }

    pub fn inv_transform_point(&self, p: Vec3) -> Vec3 {
        self.inv.transform_point(p)
    }

    pub fn inv_transform_vector(&self, v: Vec3) -> Vec3 {
        self.inv.transform_vector(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_then_inverse_round_trips() {
        let t = Transform::new(Vec3::new(1.0, 2.0, 3.0), (Vec3::new(0.0, 1.0, 0.0), 0.7), Vec3::new(2.0, 1.0, 0.5));
        let p = Vec3::new(0.3, -1.0, 4.0);
        let world = t.transform_point(p);
        let back = t.inverse().transform_point(world);
        assert!((back - p).length() < 1e-4);
    }
}
