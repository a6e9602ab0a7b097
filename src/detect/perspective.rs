//! Projective mapping between quadrilaterals.
//!
//! The homography is assembled from the closed-form unit-square solution
//! (Heckbert, Digital Image Warping §3.4.2): a transform taking the unit
//! square to each quadrilateral, composed through the adjugate of one of
//! them. The adjugate differs from the inverse only by a scalar factor,
//! which homogeneous coordinates do not see, so no determinant division is
//! needed.
use crate::geometry::Point;

/// A 3x3 homogeneous transform.
///
/// Applying it maps `(x, y)` to
/// `((a11 x + a12 y + a13) / w, (a21 x + a22 y + a23) / w)` with
/// `w = a31 x + a32 y + a33`.
#[derive(Clone, Copy, Debug)]
pub struct PerspectiveTransform {
    a11: f64,
    a12: f64,
    a13: f64,
    a21: f64,
    a22: f64,
    a23: f64,
    a31: f64,
    a32: f64,
    a33: f64,
}

impl PerspectiveTransform {
    /// Transform mapping quadrilateral `from` onto quadrilateral `to`.
    ///
    /// Corners must be listed in the same cyclic order on both sides.
    pub fn quadrilateral_to_quadrilateral(from: [Point; 4], to: [Point; 4]) -> Self {
        Self::square_to_quadrilateral(to).times(&Self::square_to_quadrilateral(from).adjugate())
    }

    /// Transform taking the unit square corners (0,0), (1,0), (1,1), (0,1)
    /// to `q[0]..q[3]`.
    fn square_to_quadrilateral(q: [Point; 4]) -> Self {
        let [p0, p1, p2, p3] = q;
        let dx3 = p0.x - p1.x + p2.x - p3.x;
        let dy3 = p0.y - p1.y + p2.y - p3.y;
        if dx3 == 0.0 && dy3 == 0.0 {
            // the quadrilateral is a parallelogram, the map is affine
            PerspectiveTransform {
                a11: p1.x - p0.x,
                a12: p2.x - p1.x,
                a13: p0.x,
                a21: p1.y - p0.y,
                a22: p2.y - p1.y,
                a23: p0.y,
                a31: 0.0,
                a32: 0.0,
                a33: 1.0,
            }
        } else {
            let dx1 = p1.x - p2.x;
            let dx2 = p3.x - p2.x;
            let dy1 = p1.y - p2.y;
            let dy2 = p3.y - p2.y;
            let denominator = dx1 * dy2 - dx2 * dy1;
            let a31 = (dx3 * dy2 - dx2 * dy3) / denominator;
            let a32 = (dx1 * dy3 - dx3 * dy1) / denominator;
            PerspectiveTransform {
                a11: p1.x - p0.x + a31 * p1.x,
                a12: p3.x - p0.x + a32 * p3.x,
                a13: p0.x,
                a21: p1.y - p0.y + a31 * p1.y,
                a22: p3.y - p0.y + a32 * p3.y,
                a23: p0.y,
                a31,
                a32,
                a33: 1.0,
            }
        }
    }

    /// Transpose of the cofactor matrix.
    fn adjugate(&self) -> Self {
        PerspectiveTransform {
            a11: self.a22 * self.a33 - self.a23 * self.a32,
            a12: self.a13 * self.a32 - self.a12 * self.a33,
            a13: self.a12 * self.a23 - self.a13 * self.a22,
            a21: self.a23 * self.a31 - self.a21 * self.a33,
            a22: self.a11 * self.a33 - self.a13 * self.a31,
            a23: self.a13 * self.a21 - self.a11 * self.a23,
            a31: self.a21 * self.a32 - self.a22 * self.a31,
            a32: self.a12 * self.a31 - self.a11 * self.a32,
            a33: self.a11 * self.a22 - self.a12 * self.a21,
        }
    }

    /// Matrix product `self * other`.
    fn times(&self, other: &Self) -> Self {
        PerspectiveTransform {
            a11: self.a11 * other.a11 + self.a12 * other.a21 + self.a13 * other.a31,
            a12: self.a11 * other.a12 + self.a12 * other.a22 + self.a13 * other.a32,
            a13: self.a11 * other.a13 + self.a12 * other.a23 + self.a13 * other.a33,
            a21: self.a21 * other.a11 + self.a22 * other.a21 + self.a23 * other.a31,
            a22: self.a21 * other.a12 + self.a22 * other.a22 + self.a23 * other.a32,
            a23: self.a21 * other.a13 + self.a22 * other.a23 + self.a23 * other.a33,
            a31: self.a31 * other.a11 + self.a32 * other.a21 + self.a33 * other.a31,
            a32: self.a31 * other.a12 + self.a32 * other.a22 + self.a33 * other.a32,
            a33: self.a31 * other.a13 + self.a32 * other.a23 + self.a33 * other.a33,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        let w = self.a31 * p.x + self.a32 * p.y + self.a33;
        Point::new(
            (self.a11 * p.x + self.a12 * p.y + self.a13) / w,
            (self.a21 * p.x + self.a22 * p.y + self.a23) / w,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9,
            "{:?} vs {:?}",
            a,
            b
        );
    }

    #[test]
    fn identity_between_equal_quads() {
        let quad = [
            Point::new(10.0, 20.0),
            Point::new(110.0, 18.0),
            Point::new(120.0, 130.0),
            Point::new(5.0, 125.0),
        ];
        let t = PerspectiveTransform::quadrilateral_to_quadrilateral(quad, quad);
        for p in [Point::new(50.0, 60.0), Point::new(11.0, 21.0), quad[2]] {
            assert_close(t.apply(p), p);
        }
    }

    #[test]
    fn maps_corners_to_corners() {
        let from = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        let to = [
            Point::new(20.0, 30.0),
            Point::new(200.0, 10.0),
            Point::new(230.0, 180.0),
            Point::new(10.0, 160.0),
        ];
        let t = PerspectiveTransform::quadrilateral_to_quadrilateral(from, to);
        for (f, expected) in from.iter().zip(&to) {
            assert_close(t.apply(*f), *expected);
        }
    }

    #[test]
    fn affine_when_parallelogram() {
        let from = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        // a pure translation plus scale
        let to = [
            Point::new(5.0, 7.0),
            Point::new(25.0, 7.0),
            Point::new(25.0, 27.0),
            Point::new(5.0, 27.0),
        ];
        let t = PerspectiveTransform::quadrilateral_to_quadrilateral(from, to);
        assert_close(t.apply(Point::new(5.0, 5.0)), Point::new(15.0, 17.0));
        // straight lines stay straight and midpoints stay midpoints for
        // affine maps
        assert_close(t.apply(Point::new(2.5, 0.0)), Point::new(10.0, 7.0));
    }

    #[test]
    fn rotated_quad_order_is_respected() {
        // same square handed over in rotated corner order: the transform
        // must rotate, not mirror
        let from = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let to = [
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(0.0, 0.0),
        ];
        let t = PerspectiveTransform::quadrilateral_to_quadrilateral(from, to);
        assert_close(t.apply(Point::new(5.0, 0.0)), Point::new(10.0, 5.0));
    }
}
