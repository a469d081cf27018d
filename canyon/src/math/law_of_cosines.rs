use num_traits::Float;

/// Returns the interior angle (in radians) between sides `a` and `b`
/// of a triangle whose opposite side is `c`.
///
/// The arccos argument is clamped to [-1, 1] when it overshoots by no
/// more than `tolerance`; larger overshoots mean the three lengths do
/// not form a triangle. Zero or negative `a`/`b` means the triangle
/// collapsed to a segment. Both cases return `None`.
pub fn law_of_cosines_angle<T>(a: T, b: T, c: T, tolerance: T) -> Option<T>
where
    T: Float,
{
    if a <= T::zero() || b <= T::zero() {
        return None;
    }
    let two = T::one() + T::one();
    let inner = (a.powi(2) + b.powi(2) - c.powi(2)) / (two * a * b);
    let clamped = if inner < -T::one() {
        if -T::one() - inner > tolerance {
            return None;
        }
        -T::one()
    } else if inner > T::one() {
        if inner - T::one() > tolerance {
            return None;
        }
        T::one()
    } else {
        inner
    };
    Some(clamped.acos())
}
