use num_traits::{Float, FromPrimitive};

/// `n` evenly spaced values from `y_start` to `y_end` inclusive.
///
/// A single value yields `y_start`.
pub fn linspace<T>(y_start: T, y_end: T, n: usize) -> impl Iterator<Item = T>
where
    T: Float + FromPrimitive,
{
    let dy = if n > 1 {
        (y_end - y_start) / T::from_usize(n - 1).unwrap_or_else(T::one)
    } else {
        T::zero()
    };
    (0..n).map(move |x| {
        if n > 1 && x == n - 1 {
            y_end
        } else {
            y_start + T::from_usize(x).unwrap_or_else(T::zero) * dy
        }
    })
}
