use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

/// 2-D point/vector used throughout the layout pipeline.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl std::fmt::Debug for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `theta` radians from the positive x axis.
    pub fn from_angle(theta: f64) -> Self {
        Self {
            x: theta.cos(),
            y: theta.sin(),
        }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2-D cross product: z-component of the 3-D cross product.
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Angle of this vector in radians, in `(-pi, pi]`.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn rotated(self, theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Normalizes an angle into `(-pi, pi]`.
pub fn normalize_angle(theta: f64) -> f64 {
    let mut t = theta % (2.0 * PI);
    if t <= -PI {
        t += 2.0 * PI;
    } else if t > PI {
        t -= 2.0 * PI;
    }
    t
}

/// Twice the signed area of the triangle `(a, b, c)`.
///
/// Positive when the triangle winds counterclockwise, so the sign tells
/// which side of the directed line `a -> b` the point `c` lies on.
pub fn signed_area(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    (b - a).cross(c - a)
}

/// True when segments `ab` and `cd` cross at an interior point of both.
///
/// Touching at an endpoint does not count: bonds that meet at a shared
/// atom are not crossings.
pub fn segments_cross(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let d1 = signed_area(c, d, a);
    let d2 = signed_area(c, d, b);
    let d3 = signed_area(a, b, c);
    let d4 = signed_area(a, b, d);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Distance from point `p` to the closed segment `ab`.
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Axis-aligned bounding box accumulated over points.
#[derive(Clone, Copy, Debug)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn include(&mut self, p: Vec2) {
        if p.x < self.min_x {
            self.min_x = p.x;
        }
        if p.y < self.min_y {
            self.min_y = p.y;
        }
        if p.x > self.max_x {
            self.max_x = p.x;
        }
        if p.y > self.max_y {
            self.max_y = p.y;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-10;

    #[test]
    fn vector_arithmetic() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -1.0);
        let sum = a + b;
        assert!((sum.x - 4.0).abs() < EPS && (sum.y - 1.0).abs() < EPS);
        let diff = a - b;
        assert!((diff.x + 2.0).abs() < EPS && (diff.y - 3.0).abs() < EPS);
        let scaled = a * 2.0;
        assert!((scaled.x - 2.0).abs() < EPS && (scaled.y - 4.0).abs() < EPS);
        let neg = -a;
        assert!((neg.x + 1.0).abs() < EPS && (neg.y + 2.0).abs() < EPS);
    }

    #[test]
    fn cross_dot_length() {
        let x = Vec2::new(1.0, 0.0);
        let y = Vec2::new(0.0, 1.0);
        assert!((x.cross(y) - 1.0).abs() < EPS);
        assert!((y.cross(x) + 1.0).abs() < EPS);
        assert!(x.dot(y).abs() < EPS);
        assert!((Vec2::new(3.0, 4.0).length() - 5.0).abs() < EPS);
    }

    #[test]
    fn angles() {
        assert!(Vec2::new(1.0, 0.0).angle().abs() < EPS);
        assert!((Vec2::new(0.0, 2.0).angle() - FRAC_PI_2).abs() < EPS);
        let unit = Vec2::from_angle(FRAC_PI_2);
        assert!(unit.x.abs() < EPS && (unit.y - 1.0).abs() < EPS);
    }

    #[test]
    fn rotation() {
        let v = Vec2::new(1.0, 0.0).rotated(FRAC_PI_2);
        assert!(v.x.abs() < EPS && (v.y - 1.0).abs() < EPS);
    }

    #[test]
    fn normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < EPS);
        assert!((normalize_angle(-3.0 * PI) - PI).abs() < EPS);
        assert!(normalize_angle(2.0 * PI).abs() < EPS);
        assert!((normalize_angle(0.5) - 0.5).abs() < EPS);
    }

    #[test]
    fn signed_area_orientation() {
        let a = Vec2::ZERO;
        let b = Vec2::new(1.0, 0.0);
        let ccw = Vec2::new(0.0, 1.0);
        let cw = Vec2::new(0.0, -1.0);
        assert!(signed_area(a, b, ccw) > 0.0);
        assert!(signed_area(a, b, cw) < 0.0);
        assert!(signed_area(a, b, Vec2::new(2.0, 0.0)).abs() < EPS);
    }

    #[test]
    fn crossing_segments() {
        let a = Vec2::new(-1.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        let c = Vec2::new(0.0, -1.0);
        let d = Vec2::new(0.0, 1.0);
        assert!(segments_cross(a, b, c, d));
    }

    #[test]
    fn disjoint_segments_do_not_cross() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        let c = Vec2::new(0.0, 1.0);
        let d = Vec2::new(1.0, 1.0);
        assert!(!segments_cross(a, b, c, d));
    }

    #[test]
    fn shared_endpoint_is_not_a_crossing() {
        let a = Vec2::ZERO;
        let b = Vec2::new(1.0, 0.0);
        let c = Vec2::new(0.0, 1.0);
        assert!(!segments_cross(a, b, a, c));
    }

    #[test]
    fn point_segment_interior_projection() {
        let d = point_segment_distance(
            Vec2::new(0.5, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
        );
        assert!((d - 1.0).abs() < EPS);
    }

    #[test]
    fn point_segment_clamps_to_endpoint() {
        let d = point_segment_distance(
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
        );
        assert!((d - 1.0).abs() < EPS);
    }

    #[test]
    fn point_segment_degenerate() {
        let p = Vec2::new(3.0, 4.0);
        let a = Vec2::ZERO;
        assert!((point_segment_distance(p, a, a) - 5.0).abs() < EPS);
    }

    #[test]
    fn bounds_accumulate() {
        let mut bounds = Bounds::new();
        assert!(bounds.is_empty());
        assert!(bounds.width().abs() < EPS);
        bounds.include(Vec2::new(1.0, 2.0));
        bounds.include(Vec2::new(-1.0, 5.0));
        assert!(!bounds.is_empty());
        assert!((bounds.width() - 2.0).abs() < EPS);
        assert!((bounds.height() - 3.0).abs() < EPS);
        let c = bounds.center();
        assert!(c.x.abs() < EPS && (c.y - 3.5).abs() < EPS);
    }
}
