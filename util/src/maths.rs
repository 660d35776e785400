//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Return the arithmetic mean of the values, or `None` if there are none.
pub fn mean<T>(values: &[T]) -> Option<T>
where
    T: Float + std::ops::AddAssign
{
    if values.is_empty() {
        return None;
    }

    let mut sum = T::zero();

    for v in values {
        sum += *v;
    }

    Some(sum / T::from(values.len())?)
}

/// Limit a value to the symmetric range `[-limit, +limit]`.
///
/// `limit` is expected to be non-negative.
pub fn saturate<T>(value: T, limit: T) -> T
where
    T: Float
{
    if value > limit {
        limit
    }
    else if value < -limit {
        -limit
    }
    else {
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean::<f64>(&[]), None);
        assert_eq!(mean(&[2f64]), Some(2f64));
        assert_eq!(mean(&[1f64, 2f64, 3f64, 6f64]), Some(3f64));
        assert_eq!(mean(&[-1f32, 1f32]), Some(0f32));
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate(0.5f64, 1f64), 0.5f64);
        assert_eq!(saturate(1.5f64, 1f64), 1f64);
        assert_eq!(saturate(-60f64, 50f64), -50f64);
        assert_eq!(saturate(-0f64, 0f64), 0f64);
    }
}
