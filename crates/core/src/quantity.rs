// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes resource-quantity strings (`500m`, `2Gi`, `1e3`).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid resource quantity {0:?}")]
pub struct QuantityError(pub String);

/// A validated quantity, keeping the text it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    raw: String,
    value: f64,
}

const BINARY_SUFFIXES: [(&str, i32); 6] =
    [("Ki", 1), ("Mi", 2), ("Gi", 3), ("Ti", 4), ("Pi", 5), ("Ei", 6)];

const DECIMAL_SUFFIXES: [(&str, i32); 10] = [
    ("n", -9),
    ("u", -6),
    ("m", -3),
    ("", 0),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
    ("P", 15),
    ("E", 18),
];

impl Quantity {
    pub fn parse(raw: &str) -> Result<Self, QuantityError> {
        let invalid = || QuantityError(raw.to_string());

        let split = number_len(raw).ok_or_else(invalid)?;
        let (number, suffix) = raw.split_at(split);
        let base: f64 = number.parse().map_err(|_| invalid())?;
        if base < 0.0 {
            return Err(invalid());
        }

        let value = if let Some((_, power)) = BINARY_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
            base * 1024f64.powi(*power)
        } else if let Some((_, exp)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
            base * 10f64.powi(*exp)
        } else {
            let exp = suffix.strip_prefix(['e', 'E']).ok_or_else(invalid)?;
            if !is_signed_int(exp) {
                return Err(invalid());
            }
            let exp: i32 = exp.parse().map_err(|_| invalid())?;
            base * 10f64.powi(exp)
        };

        Ok(Self { raw: raw.to_string(), value })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric value in base units (cores, bytes).
    pub fn value(&self) -> f64 {
        self.value
    }

    /// CPU expressed in ECS units (1024 per core), rounded up.
    pub fn cpu_units(&self) -> i64 {
        (self.value * 1024.0).ceil() as i64
    }

    /// Memory expressed in MiB, rounded up.
    pub fn mebibytes(&self) -> i64 {
        (self.value / (1024.0 * 1024.0)).ceil() as i64
    }
}

/// Length of the leading signed decimal number, if there is one.
fn number_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let mut digits = i - int_start;
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        let frac_start = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        digits += i - frac_start;
    }
    (digits > 0).then_some(i)
}

fn is_signed_int(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
#[path = "quantity_tests.rs"]
mod tests;
