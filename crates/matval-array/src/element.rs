use num_complex::{Complex32, Complex64};
use std::cmp::Ordering;
use std::fmt::Debug;

/// Element types stored in dense and sparse containers.
pub trait Element: Clone + Default + PartialEq + Debug + 'static {
    fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    fn is_nan(&self) -> bool {
        false
    }

    /// Total order used by sorting. NaN sorts after every number.
    fn sort_cmp(&self, other: &Self) -> Ordering;

    /// Combine a duplicate entry into `self` (sum for numbers, or for bools).
    fn accumulate(&mut self, other: &Self);
}

macro_rules! float_element {
    ($($t:ty),*) => {$(
        impl Element for $t {
            fn is_zero(&self) -> bool {
                *self == 0.0
            }

            fn is_nan(&self) -> bool {
                <$t>::is_nan(*self)
            }

            fn sort_cmp(&self, other: &Self) -> Ordering {
                match self.partial_cmp(other) {
                    Some(ord) => ord,
                    None => self.is_nan().cmp(&other.is_nan()),
                }
            }

            fn accumulate(&mut self, other: &Self) {
                *self += *other;
            }
        }
    )*};
}

macro_rules! complex_element {
    ($($t:ty),*) => {$(
        impl Element for $t {
            fn is_zero(&self) -> bool {
                self.re == 0.0 && self.im == 0.0
            }

            fn is_nan(&self) -> bool {
                self.re.is_nan() || self.im.is_nan()
            }

            fn sort_cmp(&self, other: &Self) -> Ordering {
                match (Element::is_nan(self), Element::is_nan(other)) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => {
                        let by_abs = self.norm().partial_cmp(&other.norm()).unwrap_or(Ordering::Equal);
                        if by_abs != Ordering::Equal {
                            return by_abs;
                        }
                        self.arg().partial_cmp(&other.arg()).unwrap_or(Ordering::Equal)
                    }
                }
            }

            fn accumulate(&mut self, other: &Self) {
                *self += *other;
            }
        }
    )*};
}

macro_rules! int_element {
    ($($t:ty),*) => {$(
        impl Element for $t {
            fn sort_cmp(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }

            fn accumulate(&mut self, other: &Self) {
                *self = self.saturating_add(*other);
            }
        }
    )*};
}

float_element!(f64, f32);
complex_element!(Complex64, Complex32);
int_element!(i8, i16, i32, i64, i128, u8, u16, u32, u64, usize);

impl Element for bool {
    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn accumulate(&mut self, other: &Self) {
        *self = *self || *other;
    }
}

impl Element for char {
    fn is_zero(&self) -> bool {
        *self == '\0'
    }

    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn accumulate(&mut self, other: &Self) {
        *self = *other;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_sorts_last() {
        assert_eq!(f64::NAN.sort_cmp(&1.0), Ordering::Greater);
        assert_eq!(1.0f64.sort_cmp(&f64::NAN), Ordering::Less);
        assert_eq!(f64::NAN.sort_cmp(&f64::NAN), Ordering::Equal);
    }

    #[test]
    fn complex_orders_by_magnitude_then_angle() {
        let a = Complex64::new(0.0, 1.0);
        let b = Complex64::new(1.0, 0.0);
        assert_eq!(b.sort_cmp(&a), Ordering::Less);
        assert_eq!(Complex64::new(3.0, 4.0).sort_cmp(&Complex64::new(1.0, 1.0)), Ordering::Greater);
    }

    #[test]
    fn negative_zero_is_zero() {
        assert!((-0.0f64).is_zero());
        assert!(Complex64::new(-0.0, 0.0).is_zero());
    }

    #[test]
    fn accumulate_saturates_integers() {
        let mut x: i8 = 120;
        x.accumulate(&10);
        assert_eq!(x, 127);
        let mut flag = false;
        flag.accumulate(&true);
        assert!(flag);
    }
}
