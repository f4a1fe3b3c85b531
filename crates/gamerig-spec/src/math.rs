//! Small vector helpers over `[f64; 3]`.

/// A point or direction in armature space.
pub type Vec3 = [f64; 3];

pub const ZERO: Vec3 = [0.0, 0.0, 0.0];
pub const UP: Vec3 = [0.0, 0.0, 1.0];

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(a: Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn length(a: Vec3) -> f64 {
    (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
}

pub fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    scale(add(a, b), 0.5)
}

/// Unit vector along `a`, or `None` for a zero vector.
pub fn normalize(a: Vec3) -> Option<Vec3> {
    let len = length(a);
    if len <= f64::EPSILON {
        None
    } else {
        Some(scale(a, 1.0 / len))
    }
}

/// Component-wise comparison within `eps`.
pub fn approx_eq(a: Vec3, b: Vec3, eps: f64) -> bool {
    (0..3).all(|i| (a[i] - b[i]).abs() <= eps)
}

/// Reflects a point through the YZ plane.
pub fn mirror_x(a: Vec3) -> Vec3 {
    [-a[0], a[1], a[2]]
}
