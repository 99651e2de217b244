//! Width selection and compact encodings for variable-length numbers.
//!
//! # Decimal words
//!
//! The 2-byte and 4-byte forms of a variable-length double are not IEEE half or single
//! precision. They store the shortest decimal text of the value as three fields: the digits with
//! the decimal point removed (the *mantissa*), the number of digits before the point (the *dot*),
//! and an optional sign bit.
//!
//! | Width | signed | unsigned |
//! |-------|--------|----------|
//! | 16 | bit 15 sign, bits 14-13 dot, bits 12-0 mantissa | bits 15-14 dot, bits 13-0 mantissa |
//! | 32 | bit 31 inverted, bit 30 sign, bits 29-27 dot, bits 26-0 mantissa | bit 31 inverted, bits 30-28 dot, bits 27-0 mantissa |
//!
//! For a value below 1 the 32-bit form sets the *inverted* flag, and the dot field counts the
//! zeros between the decimal point and the first significant digit instead. `0.0000123` is
//! stored as inverted, dot 4, mantissa 123.
//!
//! A value like `12.34` therefore round-trips exactly in two bytes, which no binary float of
//! that size can do. The price is a range that depends on the number of decimal digits rather
//! than on magnitude, which is why [`VarDouble::encode`] picks a width by trying the round trip.

use alloc::format;

const SIGN16: u16 = 0x8000;
const SIGN32: u32 = 0x4000_0000;
const INVERTED32: u32 = 0x8000_0000;

// Widest dot values the 16-bit and 32-bit words can hold.
const MAX_DOT16: usize = 3;
const MAX_DOT32: usize = 7;

/// Exact powers of ten. Every entry is representable without rounding.
const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Returns the number of bytes (1, 2, 4 or 8) needed to store `value` as a signed integer.
pub fn var_int_length(value: i64) -> usize {
    if i8::try_from(value).is_ok() {
        1
    } else if i16::try_from(value).is_ok() {
        2
    } else if i32::try_from(value).is_ok() {
        4
    } else {
        8
    }
}

/// Returns the number of bytes (1, 2, 4 or 8) needed to store `value` as an unsigned integer.
pub fn var_uint_length(value: u64) -> usize {
    if value <= 0xFF {
        1
    } else if value <= 0xFFFF {
        2
    } else if value <= 0xFFFF_FFFF {
        4
    } else {
        8
    }
}

/// Returns the number of payload bytes (1, 2, 4 or 8) that [`VarDouble::encode`] selects for
/// `value`. The width selector byte is not included.
pub fn var_double_length(value: f64, signed: bool) -> usize {
    VarDouble::encode(value, signed).width()
}

/// A double encoded at the narrowest width that reproduces it exactly.
///
/// The width selector written before the payload is [`VarDouble::selector`]. Whether the value
/// was encoded as signed is not stored; the reader must pass the same `signed` flag.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum VarDouble {
    /// An integer in `-128..=127`, signed mode. 1 byte, two's complement.
    I8(i8),
    /// An integer in `0..=255`, unsigned mode. 1 byte.
    U8(u8),
    /// A 16-bit decimal word.
    Decimal16(u16),
    /// A 32-bit decimal word.
    Decimal32(u32),
    /// A native IEEE-754 double.
    Double(f64),
}

impl VarDouble {
    /// Encodes `value` at the narrowest width whose decoding is equal to `value`.
    ///
    /// NaN, the infinities and negative zero always use [`VarDouble::Double`], so they survive
    /// bit-exactly. In unsigned mode a negative value also falls through to `Double`.
    pub fn encode(value: f64, signed: bool) -> Self {
        if !value.is_finite() || (value == 0.0 && value.is_sign_negative()) {
            return Self::Double(value);
        }

        if let Some(small) = Self::encode_byte(value, signed) {
            return small;
        }

        if let Some(word) = encode_double16(value, signed) {
            if decode_double16(word, signed) == value {
                return Self::Decimal16(word);
            }
        }

        if let Some(word) = encode_double32(value, signed) {
            if decode_double32(word, signed) == value {
                return Self::Decimal32(word);
            }
        }

        Self::Double(value)
    }

    fn encode_byte(value: f64, signed: bool) -> Option<Self> {
        let (min, max) = if signed { (-128.0, 127.0) } else { (0.0, 255.0) };
        if !(min..=max).contains(&value) {
            return None;
        }

        // In range, so the cast only drops the fraction.
        let whole = value as i16;
        if f64::from(whole) != value {
            return None;
        }

        Some(if signed {
            Self::I8(whole as i8)
        } else {
            Self::U8(whole as u8)
        })
    }

    /// The number of payload bytes.
    pub const fn width(&self) -> usize {
        match self {
            Self::I8(_) | Self::U8(_) => 1,
            Self::Decimal16(_) => 2,
            Self::Decimal32(_) => 4,
            Self::Double(_) => 8,
        }
    }

    /// The width selector byte that precedes the payload.
    pub const fn selector(&self) -> u8 {
        self.width() as u8
    }

    /// Decodes the payload. `signed` must match the flag the value was encoded with.
    pub fn to_f64(&self, signed: bool) -> f64 {
        match *self {
            Self::I8(v) => f64::from(v),
            Self::U8(v) => f64::from(v),
            Self::Decimal16(word) => decode_double16(word, signed),
            Self::Decimal32(word) => decode_double32(word, signed),
            Self::Double(v) => v,
        }
    }
}

/// Encodes `value` as a 16-bit decimal word.
///
/// Returns `None` if a field does not fit: more than 3 digits before the point, a mantissa above
/// 8191 (signed) or 16383 (unsigned), or a value below 1 with a fractional part, which needs the
/// inverted form that only the 32-bit word has. Also `None` for non-finite values and for
/// negative values when `signed` is false.
pub fn encode_double16(value: f64, signed: bool) -> Option<u16> {
    let (negative, magnitude) = split_sign(value, signed)?;
    let digits = DecimalDigits::of(magnitude)?;
    if digits.leading_zeros.is_some() {
        return None;
    }

    let (dot_shift, mantissa_max) = if signed { (13, 0x1FFF) } else { (14, 0x3FFF) };
    if digits.dot > MAX_DOT16 || digits.mantissa > mantissa_max {
        return None;
    }

    let mut word = ((digits.dot as u16) << dot_shift) | digits.mantissa as u16;
    if negative {
        word |= SIGN16;
    }
    Some(word)
}

/// Decodes a 16-bit decimal word. Any bit pattern decodes to some finite value.
pub fn decode_double16(word: u16, signed: bool) -> f64 {
    let (dot, mantissa) = if signed {
        ((word >> 13) & 0x3, word & 0x1FFF)
    } else {
        (word >> 14, word & 0x3FFF)
    };

    let magnitude = place_point(u64::from(mantissa), u32::from(dot));
    apply_sign(magnitude, signed && word & SIGN16 != 0)
}

/// Encodes `value` as a 32-bit decimal word.
///
/// Values below 1 use the inverted form. Returns `None` if a field does not fit: more than 7
/// digits before the point, more than 7 zeros after the point of an inverted value, or a mantissa
/// above 2^27 - 1 (signed) or 2^28 - 1 (unsigned). Also `None` for non-finite values and for
/// negative values when `signed` is false.
pub fn encode_double32(value: f64, signed: bool) -> Option<u32> {
    let (negative, magnitude) = split_sign(value, signed)?;
    let digits = DecimalDigits::of(magnitude)?;

    let (dot_shift, mantissa_max) = if signed {
        (27, 0x07FF_FFFF)
    } else {
        (28, 0x0FFF_FFFF)
    };

    let (dot, inverted) = match digits.leading_zeros {
        Some(zeros) => (zeros, INVERTED32),
        None => (digits.dot, 0),
    };
    if dot > MAX_DOT32 || digits.mantissa > mantissa_max {
        return None;
    }

    let mut word = inverted | ((dot as u32) << dot_shift) | digits.mantissa as u32;
    if negative {
        word |= SIGN32;
    }
    Some(word)
}

/// Decodes a 32-bit decimal word. Any bit pattern decodes to some finite value.
pub fn decode_double32(word: u32, signed: bool) -> f64 {
    let (dot, mantissa) = if signed {
        ((word >> 27) & 0x7, word & 0x07FF_FFFF)
    } else {
        ((word >> 28) & 0x7, word & 0x0FFF_FFFF)
    };
    let mantissa = u64::from(mantissa);

    let magnitude = if word & INVERTED32 != 0 {
        // 0. + `dot` zeros + mantissa digits
        scale_down(mantissa, dot + digit_count(mantissa))
    } else {
        place_point(mantissa, dot)
    };
    apply_sign(magnitude, signed && word & SIGN32 != 0)
}

/// The digit fields of the shortest decimal text of a finite, non-negative double.
struct DecimalDigits {
    /// Digits before the point; 0 when the text has no point.
    dot: usize,
    /// Zeros between the point and the first significant digit, when the integer part is `0`.
    leading_zeros: Option<usize>,
    /// All digits with the point removed.
    mantissa: u64,
}

impl DecimalDigits {
    fn of(magnitude: f64) -> Option<Self> {
        // `Display` for f64 prints the shortest round-trip digits and never uses an exponent.
        let text = format!("{magnitude}");

        let Some((whole, fraction)) = text.split_once('.') else {
            return Some(Self {
                dot: 0,
                leading_zeros: None,
                mantissa: text.parse().ok()?,
            });
        };

        let mantissa = whole
            .bytes()
            .chain(fraction.bytes())
            .try_fold(0u64, |acc, d| {
                acc.checked_mul(10)?.checked_add(u64::from(d.wrapping_sub(b'0')))
            })?;

        let leading_zeros =
            (whole == "0").then(|| fraction.len() - fraction.trim_start_matches('0').len());

        Some(Self {
            dot: whole.len(),
            leading_zeros,
            mantissa,
        })
    }
}

fn split_sign(value: f64, signed: bool) -> Option<(bool, f64)> {
    if !value.is_finite() {
        return None;
    }
    if value < 0.0 {
        signed.then_some((true, -value))
    } else if value == 0.0 {
        Some((false, 0.0))
    } else {
        Some((false, value))
    }
}

fn apply_sign(magnitude: f64, negative: bool) -> f64 {
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn digit_count(n: u64) -> u32 {
    n.checked_ilog10().map_or(1, |d| d + 1)
}

/// Inserts a decimal point after the first `dot` digits of `mantissa`. A `dot` of 0, or one that
/// leaves no fractional digits, yields the integer itself.
fn place_point(mantissa: u64, dot: u32) -> f64 {
    let digits = digit_count(mantissa);
    if dot == 0 || dot >= digits {
        return mantissa as f64;
    }
    scale_down(mantissa, digits - dot)
}

/// `mantissa / 10^places`. Both operands are exact, so the quotient is rounded the same way as
/// parsing the equivalent decimal text.
fn scale_down(mantissa: u64, places: u32) -> f64 {
    mantissa as f64 / POW10[places as usize]
}
