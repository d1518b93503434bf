//! Literal values and the 256-bit word they evaluate to

use std::fmt;

/// Unsigned 256-bit integer, stored as big-endian 64-bit limbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct U256([u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0; 4]);
    pub const ONE: U256 = U256([0, 0, 0, 1]);
    pub const MAX: U256 = U256([u64::MAX; 4]);

    pub fn from_u64(value: u64) -> Self {
        U256([0, 0, 0, value])
    }

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *limb = u64::from_be_bytes(word);
        }
        U256(limbs)
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (chunk, limb) in bytes.chunks_exact_mut(8).zip(self.0) {
            chunk.copy_from_slice(&limb.to_be_bytes());
        }
        bytes
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// `self * mul + add`, or `None` on overflow
    fn checked_mul_add(self, mul: u64, add: u64) -> Option<Self> {
        let mut limbs = self.0;
        let mut carry = add as u128;
        for limb in limbs.iter_mut().rev() {
            let product = (*limb as u128) * (mul as u128) + carry;
            *limb = product as u64;
            carry = product >> 64;
        }
        if carry == 0 { Some(U256(limbs)) } else { None }
    }

    fn div_rem_small(self, divisor: u64) -> (Self, u64) {
        let mut limbs = self.0;
        let mut remainder: u128 = 0;
        for limb in limbs.iter_mut() {
            let current = (remainder << 64) | (*limb as u128);
            *limb = (current / divisor as u128) as u64;
            remainder = current % divisor as u128;
        }
        (U256(limbs), remainder as u64)
    }

    fn parse_radix(digits: &str, radix: u32) -> Option<Self> {
        if digits.is_empty() {
            return None;
        }
        digits.chars().try_fold(Self::ZERO, |acc, c| {
            let digit = c.to_digit(radix)?;
            acc.checked_mul_add(radix as u64, digit as u64)
        })
    }

    /// Parse a decimal or `0x`-prefixed hexadecimal number literal.
    /// Returns `None` for malformed text and for values above 2^256 - 1.
    pub fn parse_literal(text: &str) -> Option<Self> {
        match text.strip_prefix("0x") {
            Some(hex) => Self::parse_radix(hex, 16),
            None => Self::parse_radix(text, 10),
        }
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut digits = Vec::new();
        let mut value = *self;
        while !value.is_zero() {
            let (quotient, digit) = value.div_rem_small(10);
            digits.push(char::from(b'0' + digit as u8));
            value = quotient;
        }
        let text: String = digits.into_iter().rev().collect();
        write!(f, "{text}")
    }
}

/// Packs up to 32 bytes of `text` left-aligned into a word
pub fn value_of_string_literal(text: &str) -> U256 {
    let mut bytes = [0u8; 32];
    for (dst, src) in bytes.iter_mut().zip(text.as_bytes()) {
        *dst = *src;
    }
    U256::from_be_bytes(bytes)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Word(U256),
    /// String argument of a builtin that is not bound to the 32 byte limit
    Unlimited(String),
}

/// The value of a literal together with its source spelling
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiteralValue {
    repr: Repr,
    hint: Option<String>,
}

impl LiteralValue {
    pub fn word(value: U256) -> Self {
        Self {
            repr: Repr::Word(value),
            hint: None,
        }
    }

    pub fn with_hint(value: U256, hint: impl Into<String>) -> Self {
        Self {
            repr: Repr::Word(value),
            hint: Some(hint.into()),
        }
    }

    /// Number literal from its source text. Values that do not fit keep
    /// their text as hint so the analyzer can report them.
    pub fn number(text: &str) -> Self {
        let value = U256::parse_literal(text).unwrap_or(U256::MAX);
        Self::with_hint(value, text)
    }

    pub fn boolean(value: bool) -> Self {
        let word = if value { U256::ONE } else { U256::ZERO };
        Self::with_hint(word, if value { "true" } else { "false" })
    }

    pub fn string(text: &str) -> Self {
        Self::with_hint(value_of_string_literal(text), text)
    }

    pub fn unlimited(text: impl Into<String>) -> Self {
        Self {
            repr: Repr::Unlimited(text.into()),
            hint: None,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self.repr, Repr::Unlimited(_))
    }

    /// The word value. Unlimited literals have none.
    pub fn value(&self) -> U256 {
        match &self.repr {
            Repr::Word(value) => *value,
            Repr::Unlimited(_) => panic!("unlimited literal has no word value"),
        }
    }

    pub fn builtin_string_literal_value(&self) -> &str {
        match &self.repr {
            Repr::Unlimited(text) => text,
            Repr::Word(_) => panic!("literal is not an unlimited string literal"),
        }
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Convert into an unlimited literal carrying the same text
    pub fn into_unlimited(self) -> Self {
        match (self.repr, self.hint) {
            (Repr::Unlimited(text), _) | (Repr::Word(_), Some(text)) => Self::unlimited(text),
            (Repr::Word(value), None) => {
                let bytes = value.to_be_bytes();
                let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
                Self::unlimited(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
        }
    }
}
