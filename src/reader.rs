use alloc::string::String;
use alloc::vec::Vec;

use zerocopy::byteorder::{BE, F32, F64, I16, I32, I64, LE, U16, U32, U64};

use crate::buffer::{BinaryBuffer, Endian};
use crate::error::{BufferError, Result};
use crate::varlen::VarDouble;

/// Generates a fixed-width read that honors the buffer's byte order.
macro_rules! read_endian {
    ($($(#[$attr:meta])* fn $name:ident() -> $ty:ty = $wire:ident[$n:literal];)*) => {
        $(
            $(#[$attr])*
            #[inline]
            pub fn $name(&mut self) -> Result<$ty> {
                let bytes = self.read_cbytes::<$n>()?;
                Ok(match self.endian {
                    Endian::Big => $wire::<BE>::from_bytes(bytes).get(),
                    Endian::Little => $wire::<LE>::from_bytes(bytes).get(),
                })
            }
        )*
    };
}

/// Reading values.
///
/// Every read starts at the cursor and advances it past the bytes it consumed. A read that fails
/// leaves the cursor where it was, including the reads that consume several fields (strings,
/// varints, variable-length doubles).
impl BinaryBuffer<'_> {
    /// Runs `f`, restoring the cursor if it fails.
    fn rewind_on_err<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.pos;
        let result = f(self);
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    /// Reads a slice of bytes whose length is `len`. This function returns a slice reference
    /// to the bytes; it does not copy them.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        let start = self.pos;
        let end = match start.checked_add(len) {
            Some(end) if end <= self.data.len() => end,
            _ => {
                return Err(BufferError::OutOfRange {
                    position: start,
                    needed: len,
                    len: self.data.len(),
                })
            }
        };
        self.pos = end;
        Ok(&self.data[start..end])
    }

    /// Reads a small array of bytes, with a constant length.
    #[inline]
    pub fn read_cbytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Reads every byte from the cursor to the end of the buffer.
    pub fn read_remaining(&mut self) -> &[u8] {
        let start = self.pos;
        self.pos = self.data.len();
        &self.data[start..]
    }

    /// Reads `count` bytes into `dest[offset..offset + count]`.
    ///
    /// Fails with [`BufferError::SliceRange`] if `dest` is too short, without reading anything.
    pub fn read_bytes_into(&mut self, dest: &mut [u8], offset: usize, count: usize) -> Result<()> {
        let range = slice_range(dest.len(), offset, count)?;
        dest[range].copy_from_slice(self.read_bytes(count)?);
        Ok(())
    }

    /// Reads a single `u8` value.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let [b] = self.read_cbytes()?;
        Ok(b)
    }

    /// Reads a single `i8` value, stored in two's complement.
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads a `bool`. Any non-zero byte is `true`.
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a single-byte character. The byte is interpreted as Latin-1.
    #[inline]
    pub fn read_char(&mut self) -> Result<char> {
        Ok(char::from(self.read_u8()?))
    }

    read_endian! {
        /// Reads a `u16`.
        fn read_u16() -> u16 = U16[2];
        /// Reads an `i16`.
        fn read_i16() -> i16 = I16[2];
        /// Reads a `u32`.
        fn read_u32() -> u32 = U32[4];
        /// Reads an `i32`.
        fn read_i32() -> i32 = I32[4];
        /// Reads a `u64`.
        fn read_u64() -> u64 = U64[8];
        /// Reads an `i64`.
        fn read_i64() -> i64 = I64[8];
        /// Reads an IEEE-754 single-precision float.
        fn read_f32() -> f32 = F32[4];
        /// Reads an IEEE-754 double-precision float.
        fn read_f64() -> f64 = F64[8];
    }

    /// Reads an unsigned 24-bit integer. This is always big-endian, regardless of
    /// [`endian`](Self::endian).
    pub fn read_u24(&mut self) -> Result<u32> {
        let [hi, mid, lo] = self.read_cbytes()?;
        Ok(u32::from_be_bytes([0, hi, mid, lo]))
    }

    /// Reads `len` bytes as ASCII text. Bytes above 0x7F become `?`.
    pub fn read_ascii(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        Ok(bytes
            .iter()
            .map(|&b| if b.is_ascii() { char::from(b) } else { '?' })
            .collect())
    }

    /// Reads a UTF-8 string with a 16-bit length prefix.
    ///
    /// A single trailing NUL byte in the string body is removed before decoding.
    pub fn read_string(&mut self) -> Result<String> {
        self.rewind_on_err(|this| {
            let len = this.read_u16()?;
            this.read_string_exact(usize::from(len))
        })
    }

    /// Reads a UTF-8 string body of exactly `len` bytes, with no length prefix.
    ///
    /// A single trailing NUL byte is removed before decoding.
    pub fn read_string_exact(&mut self, len: usize) -> Result<String> {
        self.rewind_on_err(|this| {
            let body = strip_nul(this.read_bytes(len)?);
            if body.is_empty() {
                return Ok(String::new());
            }
            core::str::from_utf8(body)
                .map(String::from)
                .map_err(|_| BufferError::InvalidUtf8 { len: body.len() })
        })
    }

    /// Reads a string with a 16-bit length prefix and returns it as `bstr::BStr`, without
    /// validating that it is UTF-8. A single trailing NUL byte is removed.
    ///
    /// This does not copy any data.
    #[cfg(feature = "bstr")]
    pub fn read_bstr(&mut self) -> Result<&bstr::BStr> {
        let body = self.rewind_on_err(|this| {
            let len = usize::from(this.read_u16()?);
            let start = this.pos;
            this.read_bytes(len)?;
            Ok(start..this.pos)
        })?;
        Ok(bstr::BStr::new(strip_nul(&self.data[body])))
    }

    /// Reads one byte of 8 flags. Element `i` is bit `i`, least significant first.
    pub fn read_flags(&mut self) -> Result<[bool; 8]> {
        let byte = self.read_u8()?;
        Ok(core::array::from_fn(|i| byte & (1 << i) != 0))
    }

    /// Reads a bit array of `count` bits.
    ///
    /// The bit count is not stored in the stream; the caller must know it. This consumes
    /// `ceil(count / 8)` bytes and discards the padding bits of the last byte.
    pub fn read_bit_array(&mut self, count: usize) -> Result<Vec<bool>> {
        let bytes = self.read_bytes(count.div_ceil(8))?;
        Ok((0..count).map(|i| bytes[i / 8] & (1 << (i % 8)) != 0).collect())
    }

    /// Same as [`read_bit_array`](Self::read_bit_array), returning each bit as 0 or 1.
    pub fn read_bit_array_ints(&mut self, count: usize) -> Result<Vec<u8>> {
        let bytes = self.read_bytes(count.div_ceil(8))?;
        Ok((0..count).map(|i| (bytes[i / 8] >> (i % 8)) & 1).collect())
    }

    /// Reads a variable-length `u32`, using 1 to 5 bytes.
    ///
    /// Each byte holds 7 bits of the value, least significant group first, and bit 0x80 is set if
    /// another byte follows. The 5th byte, if reached, supplies the top bits unconditionally.
    pub fn read_var_u32(&mut self) -> Result<u32> {
        const MORE: u8 = 0x80;

        self.rewind_on_err(|this| {
            let mut n: u32 = 0;
            for shift in [0, 7, 14, 21] {
                let b = this.read_u8()?;
                n |= u32::from(b & 0x7f) << shift;
                if b & MORE == 0 {
                    return Ok(n);
                }
            }
            let b = this.read_u8()?;
            Ok(n | (u32::from(b) << 28))
        })
    }

    /// Reads a variable-length `i32` written by [`write_var_i32`](Self::write_var_i32).
    ///
    /// Bit 0 of the decoded unsigned value is the sign; the remaining bits hold `v` for
    /// non-negative values and `-v - 1` for negative ones.
    pub fn read_var_i32(&mut self) -> Result<i32> {
        let u = self.read_var_u32()?;
        let magnitude = (u >> 1) as i32;
        Ok(if u & 1 == 1 {
            // -(magnitude + 1), wrapping so that i32::MIN decodes
            !magnitude
        } else {
            magnitude
        })
    }

    /// Reads a variable-length double written by
    /// [`write_var_double`](Self::write_var_double). `signed` must match the writer's flag.
    ///
    /// The first byte selects the payload width. Selectors other than 1, 2 or 4 are decoded as an
    /// 8-byte double, which is what older encoders expect; use
    /// [`read_var_double_strict`](Self::read_var_double_strict) to reject them instead.
    pub fn read_var_double(&mut self, signed: bool) -> Result<f64> {
        self.rewind_on_err(|this| {
            let selector = this.read_u8()?;
            if !matches!(selector, 1 | 2 | 4 | 8) && tracing::enabled!(tracing::Level::WARN) {
                tracing::warn!(
                    selector,
                    position = this.pos - 1,
                    "unknown var-double width selector, decoding as 8-byte double"
                );
            }
            this.read_var_double_payload(selector, signed)
        })
    }

    /// Same as [`read_var_double`](Self::read_var_double), but a selector other than 1, 2, 4 or 8
    /// fails with [`BufferError::InvalidWidth`].
    pub fn read_var_double_strict(&mut self, signed: bool) -> Result<f64> {
        self.rewind_on_err(|this| {
            let selector = this.read_u8()?;
            if !matches!(selector, 1 | 2 | 4 | 8) {
                return Err(BufferError::InvalidWidth { selector });
            }
            this.read_var_double_payload(selector, signed)
        })
    }

    fn read_var_double_payload(&mut self, selector: u8, signed: bool) -> Result<f64> {
        let encoded = match selector {
            1 if signed => VarDouble::I8(self.read_i8()?),
            1 => VarDouble::U8(self.read_u8()?),
            2 => VarDouble::Decimal16(self.read_u16()?),
            4 => VarDouble::Decimal32(self.read_u32()?),
            _ => VarDouble::Double(self.read_f64()?),
        };
        Ok(encoded.to_f64(signed))
    }
}

/// Removes a single trailing NUL, left by writers that emit null-terminated strings.
fn strip_nul(bytes: &[u8]) -> &[u8] {
    match bytes.split_last() {
        Some((0, rest)) => rest,
        _ => bytes,
    }
}

/// Validates `offset..offset + count` against a caller slice of length `len`.
pub(crate) fn slice_range(len: usize, offset: usize, count: usize) -> Result<core::ops::Range<usize>> {
    match offset.checked_add(count) {
        Some(end) if end <= len => Ok(offset..end),
        _ => Err(BufferError::SliceRange { offset, count, len }),
    }
}
