//! Intermediate points along a great circle.
//!
//! Adapted from the [geo] crate's haversine intermediate routines,
//! reshaped to emit a fixed number of points instead of a fixed step.
//!
//! [geo](https://github.com/georust/geo/blob/eb0cd98f3ccfa226631af23d94d66d214ea66488/geo/src/algorithm/haversine_intermediate.rs)

use geo::{CoordFloat, Point};
use num_traits::FromPrimitive;

/// Yields `n` evenly spaced points from `start` to `end`, inclusive
/// of both.
///
/// Coincident endpoints yield `n` copies of `start`.
pub struct GreatCircleIter<T: CoordFloat = f64> {
    arc: ArcTerms<T>,
    start: Point<T>,
    index: usize,
    len: usize,
}

impl<T: CoordFloat + FromPrimitive> GreatCircleIter<T> {
    pub fn new(start: Point<T>, end: Point<T>, n: usize) -> Self {
        Self {
            arc: ArcTerms::new(&start, &end),
            start,
            index: 0,
            len: n,
        }
    }

    /// Fraction along the path of the `index`th point.
    fn fraction(&self, index: usize) -> T {
        if self.len < 2 {
            T::zero()
        } else {
            T::from_usize(index).unwrap_or_else(T::zero)
                / T::from_usize(self.len - 1).unwrap_or_else(T::one)
        }
    }
}

impl<T: CoordFloat + FromPrimitive> Iterator for GreatCircleIter<T> {
    type Item = Point<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let f = self.fraction(self.index);
        self.index += 1;
        Some(self.arc.point_at(f).unwrap_or(self.start))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<T: CoordFloat + FromPrimitive> ExactSizeIterator for GreatCircleIter<T> {}

/// Precomputed cartesian terms of the arc between two points.
struct ArcTerms<T> {
    /// Central angle (radians).
    delta: T,
    start_xyz: [T; 3],
    end_xyz: [T; 3],
}

impl<T: CoordFloat> ArcTerms<T> {
    fn new(p1: &Point<T>, p2: &Point<T>) -> Self {
        let two = T::one() + T::one();

        let lat1 = p1.y().to_radians();
        let lon1 = p1.x().to_radians();
        let lat2 = p2.y().to_radians();
        let lon2 = p2.x().to_radians();

        let (lat1_sin, lat1_cos) = lat1.sin_cos();
        let (lat2_sin, lat2_cos) = lat2.sin_cos();
        let (lon1_sin, lon1_cos) = lon1.sin_cos();
        let (lon2_sin, lon2_cos) = lon2.sin_cos();

        let k = (((lat1 - lat2) / two).sin().powi(2)
            + lat1_cos * lat2_cos * ((lon1 - lon2) / two).sin().powi(2))
        .sqrt();

        Self {
            delta: two * k.min(T::one()).asin(),
            start_xyz: [lat1_cos * lon1_cos, lat1_cos * lon1_sin, lat1_sin],
            end_xyz: [lat2_cos * lon2_cos, lat2_cos * lon2_sin, lat2_sin],
        }
    }

    /// Point at fraction `f` of the arc, or `None` when the arc is
    /// degenerate (coincident or antipodal endpoints).
    fn point_at(&self, f: T) -> Option<Point<T>> {
        let sin_delta = self.delta.sin();
        if sin_delta.abs() <= T::epsilon() {
            return None;
        }

        let a = ((T::one() - f) * self.delta).sin() / sin_delta;
        let b = (f * self.delta).sin() / sin_delta;

        let [x1, y1, z1] = self.start_xyz;
        let [x2, y2, z2] = self.end_xyz;
        let x = a * x1 + b * x2;
        let y = a * y1 + b * y2;
        let z = a * z1 + b * z2;

        let lat = z.atan2(x.hypot(y));
        let lon = y.atan2(x);
        Some(Point::new(lon.to_degrees(), lat.to_degrees()))
    }
}
