use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use fontstore_core_store::Error;

/// A coordinate or metric that remembers whether it was written as an
/// integer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub const ZERO: Number = Number::Integer(0);
    pub const ONE: Number = Number::Integer(1);

    /// Parse a numeric literal.
    ///
    /// Integral literals stay exact; anything with a fraction or exponent is
    /// a float.
    ///
    /// ```rust
    /// use fontstore_glif::Number;
    ///
    /// assert_eq!(Number::parse("12").unwrap(), Number::Integer(12));
    /// assert_eq!(Number::parse("-0.5").unwrap(), Number::Float(-0.5));
    /// assert_eq!(Number::parse("1e3").unwrap(), Number::Float(1000.0));
    /// assert!(Number::parse("twelve").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Number, Error> {
        lazy_static! {
            static ref INTEGER: Regex = Regex::new(r"^[+-]?[0-9]+$").unwrap();
            static ref FLOAT: Regex =
                Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$").unwrap();
        }

        let invalid = || Error::InvalidNumber {
            text: text.to_string(),
        };
        let trimmed = text.trim();
        if INTEGER.is_match(trimmed) {
            // Out of i64 range is still a valid number, just not an exact one
            return match trimmed.parse::<i64>() {
                Ok(i) => Ok(Number::Integer(i)),
                Err(_) => trimmed.parse::<f64>().map(Number::Float).map_err(|_| invalid()),
            };
        }
        if FLOAT.is_match(trimmed) {
            return trimmed.parse::<f64>().map(Number::Float).map_err(|_| invalid());
        }
        Err(invalid())
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    /// Numeric equality, ignoring the integer/float distinction.
    pub fn same_value(self, other: Number) -> bool {
        self.as_f64() == other.as_f64()
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::ZERO
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Number::Integer(i)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::Float(f)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            // Debug keeps the fraction, so "1.0" reads back as a float
            Number::Float(x) => write!(f, "{:?}", x),
        }
    }
}
