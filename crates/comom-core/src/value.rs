//! Exact rational values with an explicit undefined state.
//!
//! Every quantity that flows through a solve pass is a [`Value`]: either an
//! exact [`BigRational`] or `Undefined`. Undefined is absorbing for every
//! arithmetic operation with a single exception: multiplying by an exact
//! zero yields exact zero, so a zero coefficient never taints a sum.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// An exact rational number or the undefined sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    /// A known exact value
    Defined(BigRational),
    /// Not computable from the information available so far
    #[default]
    Undefined,
}

impl Value {
    /// Exact integer value.
    pub fn from_integer(n: i64) -> Self {
        Value::Defined(BigRational::from_integer(BigInt::from(n)))
    }

    /// Exact fraction `numer / denom`. A zero denominator gives `Undefined`.
    pub fn from_ratio(numer: i64, denom: i64) -> Self {
        if denom == 0 {
            return Value::Undefined;
        }
        Value::Defined(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    /// True for `Undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// The exact value, if defined.
    pub fn as_rational(&self) -> Option<&BigRational> {
        match self {
            Value::Defined(r) => Some(r),
            Value::Undefined => None,
        }
    }

    /// Consumes the value, returning the exact rational if defined.
    pub fn into_rational(self) -> Option<BigRational> {
        match self {
            Value::Defined(r) => Some(r),
            Value::Undefined => None,
        }
    }

    /// Absolute value.
    pub fn abs(&self) -> Value {
        match self {
            Value::Defined(r) => Value::Defined(r.abs()),
            Value::Undefined => Value::Undefined,
        }
    }

    /// Multiplies by an exact coefficient.
    pub fn scale(&self, coefficient: &BigRational) -> Value {
        if coefficient.is_zero() {
            return Value::zero();
        }
        match self {
            Value::Defined(r) => Value::Defined(r * coefficient),
            Value::Undefined => Value::Undefined,
        }
    }

    /// `self += coefficient * other`, the accumulation step of every
    /// row product.
    pub fn add_scaled(&mut self, coefficient: &BigRational, other: &Value) {
        if coefficient.is_zero() {
            return;
        }
        *self = match (&*self, other) {
            (Value::Defined(acc), Value::Defined(v)) => Value::Defined(acc + coefficient * v),
            _ => Value::Undefined,
        };
    }
}

/// Exact integer as a rational.
pub fn integer(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

impl From<BigRational> for Value {
    fn from(r: BigRational) -> Self {
        Value::Defined(r)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Defined(BigRational::from_integer(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::from_integer(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Defined(r) => write!(f, "{}", r),
            Value::Undefined => write!(f, "undefined"),
        }
    }
}

impl<'a> Add<&'a Value> for &'a Value {
    type Output = Value;

    fn add(self, rhs: &'a Value) -> Value {
        match (self, rhs) {
            (Value::Defined(a), Value::Defined(b)) => Value::Defined(a + b),
            _ => Value::Undefined,
        }
    }
}

impl<'a> Sub<&'a Value> for &'a Value {
    type Output = Value;

    fn sub(self, rhs: &'a Value) -> Value {
        match (self, rhs) {
            (Value::Defined(a), Value::Defined(b)) => Value::Defined(a - b),
            _ => Value::Undefined,
        }
    }
}

impl<'a> Mul<&'a Value> for &'a Value {
    type Output = Value;

    fn mul(self, rhs: &'a Value) -> Value {
        match (self, rhs) {
            (Value::Defined(a), Value::Defined(b)) => Value::Defined(a * b),
            (Value::Defined(z), Value::Undefined) | (Value::Undefined, Value::Defined(z))
                if z.is_zero() =>
            {
                Value::zero()
            }
            _ => Value::Undefined,
        }
    }
}

impl<'a> Div<&'a Value> for &'a Value {
    type Output = Value;

    fn div(self, rhs: &'a Value) -> Value {
        match (self, rhs) {
            (Value::Defined(a), Value::Defined(b)) if !b.is_zero() => Value::Defined(a / b),
            _ => Value::Undefined,
        }
    }
}

impl Neg for &Value {
    type Output = Value;

    fn neg(self) -> Value {
        match self {
            Value::Defined(r) => Value::Defined(-r),
            Value::Undefined => Value::Undefined,
        }
    }
}

macro_rules! forward_owned_binop {
    ($($imp:ident, $method:ident);*) => {
        $(
            impl $imp<Value> for Value {
                type Output = Value;

                fn $method(self, rhs: Value) -> Value {
                    (&self).$method(&rhs)
                }
            }

            impl<'a> $imp<&'a Value> for Value {
                type Output = Value;

                fn $method(self, rhs: &'a Value) -> Value {
                    (&self).$method(rhs)
                }
            }
        )*
    };
}

forward_owned_binop!(Add, add; Sub, sub; Mul, mul; Div, div);

impl Neg for Value {
    type Output = Value;

    fn neg(self) -> Value {
        -&self
    }
}

impl Zero for Value {
    fn zero() -> Self {
        Value::Defined(BigRational::zero())
    }

    fn is_zero(&self) -> bool {
        matches!(self, Value::Defined(r) if r.is_zero())
    }
}

impl One for Value {
    fn one() -> Self {
        Value::Defined(BigRational::one())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_times_nonzero_is_undefined() {
        let u = Value::Undefined;
        let c = Value::from_integer(3);
        assert!((&u * &c).is_undefined());
        assert!((&c * &u).is_undefined());
        assert!(u.scale(&BigRational::from_integer(BigInt::from(-2))).is_undefined());
    }

    #[test]
    fn test_undefined_times_zero_is_zero() {
        let u = Value::Undefined;
        let z = Value::zero();
        assert_eq!(&u * &z, Value::zero());
        assert_eq!(&z * &u, Value::zero());
        assert_eq!(u.scale(&BigRational::zero()), Value::zero());
    }

    #[test]
    fn test_undefined_propagates_through_sums() {
        let u = Value::Undefined;
        let a = Value::from_ratio(1, 2);
        assert!((&a + &u).is_undefined());
        assert!((&u - &a).is_undefined());
        assert!((&a / &u).is_undefined());
        assert!((-&u).is_undefined());

        let mut acc = a.clone();
        acc.add_scaled(&BigRational::zero(), &u);
        assert_eq!(acc, a);
        acc.add_scaled(&BigRational::one(), &u);
        assert!(acc.is_undefined());
    }

    #[test]
    fn test_division_by_zero_is_undefined() {
        let a = Value::from_integer(7);
        assert!((&a / &Value::zero()).is_undefined());
        assert!(Value::from_ratio(1, 0).is_undefined());
    }

    #[test]
    fn test_exact_arithmetic() {
        let a = Value::from_ratio(1, 3);
        let b = Value::from_ratio(1, 6);
        assert_eq!(&a + &b, Value::from_ratio(1, 2));
        assert_eq!(&a - &b, Value::from_ratio(1, 6));
        assert_eq!(&a * &b, Value::from_ratio(1, 18));
        assert_eq!(&a / &b, Value::from_integer(2));
        assert_eq!(Value::from_ratio(-3, 4).abs(), Value::from_ratio(3, 4));
        assert_eq!(format!("{}", Value::from_ratio(563, 8)), "563/8");
    }
}
