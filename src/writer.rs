use zerocopy::byteorder::{BE, F32, F64, I16, I32, I64, LE, U16, U32, U64};

use crate::buffer::{BinaryBuffer, Endian};
use crate::error::{BufferError, Result};
use crate::reader::slice_range;
use crate::varlen::VarDouble;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Generates a fixed-width write that honors the buffer's byte order.
macro_rules! write_endian {
    ($($(#[$attr:meta])* fn $name:ident($ty:ty) = $wire:ident;)*) => {
        $(
            $(#[$attr])*
            #[inline]
            pub fn $name(&mut self, value: $ty) {
                match self.endian {
                    Endian::Big => self.write_cbytes($wire::<BE>::new(value).to_bytes()),
                    Endian::Little => self.write_cbytes($wire::<LE>::new(value).to_bytes()),
                }
            }
        )*
    };
}

/// Writing values.
///
/// Every write starts at the cursor and advances it. Bytes already at the cursor are overwritten;
/// once the end is reached, the buffer grows. Writing to a [`view`](BinaryBuffer::view) first
/// copies the viewed bytes into owned storage.
impl BinaryBuffer<'_> {
    /// Writes `bytes` to the output.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.is_view() && tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!(len = self.data.len(), "copying borrowed view for write");
        }

        let data = self.data.to_mut();
        let start = self.pos;
        let overlap = (data.len() - start).min(bytes.len());
        data[start..start + overlap].copy_from_slice(&bytes[..overlap]);
        data.extend_from_slice(&bytes[overlap..]);
        self.pos = start + bytes.len();
    }

    /// Writes `src[offset..offset + count]` to the output.
    pub fn write_bytes_range(&mut self, src: &[u8], offset: usize, count: usize) -> Result<()> {
        let range = slice_range(src.len(), offset, count)?;
        self.write_bytes(&src[range]);
        Ok(())
    }

    /// Writes the full contents of `other`, regardless of its cursor.
    pub fn write_buffer(&mut self, other: &BinaryBuffer<'_>) {
        self.write_bytes(other.as_bytes());
    }

    /// Writes a small, fixed-size array of bytes.
    #[inline]
    pub fn write_cbytes<const N: usize>(&mut self, value: [u8; N]) {
        self.write_bytes(&value)
    }

    /// Writes a single `u8` value
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value])
    }

    /// Writes a single `i8` value, in two's complement.
    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.write_bytes(&[value as u8])
    }

    /// Writes a `bool` value. True is encoded as 1. False is encoded as 0.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8)
    }

    /// Writes a single-byte (Latin-1) character.
    ///
    /// Fails with [`BufferError::CharOutOfRange`] for code points above U+00FF.
    pub fn write_char(&mut self, value: char) -> Result<()> {
        let b = u8::try_from(value).map_err(|_| BufferError::CharOutOfRange { ch: value })?;
        self.write_u8(b);
        Ok(())
    }

    write_endian! {
        /// Writes a single `u16` value
        fn write_u16(u16) = U16;
        /// Writes a single `i16` value
        fn write_i16(i16) = I16;
        /// Writes a single `u32` value
        fn write_u32(u32) = U32;
        /// Writes a single `i32` value
        fn write_i32(i32) = I32;
        /// Writes a single `u64` value
        fn write_u64(u64) = U64;
        /// Writes a single `i64` value
        fn write_i64(i64) = I64;
        /// Writes an `f32` value using its 4-byte IEEE-754 representation.
        fn write_f32(f32) = F32;
        /// Writes an `f64` value using its 8-byte IEEE-754 representation.
        fn write_f64(f64) = F64;
    }

    /// Writes the low 24 bits of `value`, always big-endian.
    pub fn write_u24(&mut self, value: u32) {
        let [_, hi, mid, lo] = value.to_be_bytes();
        self.write_cbytes([hi, mid, lo]);
    }

    /// Writes `value` as two upper-case hex digit characters, followed by `separator` if given.
    pub fn write_byte_hex(&mut self, value: u8, separator: Option<u8>) {
        self.write_cbytes([
            HEX_DIGITS[usize::from(value >> 4)],
            HEX_DIGITS[usize::from(value & 0xf)],
        ]);
        if let Some(sep) = separator {
            self.write_u8(sep);
        }
    }

    /// Writes `value` as four upper-case hex digit characters, followed by `separator` if given.
    pub fn write_u16_hex(&mut self, value: u16, separator: Option<u8>) {
        let [hi, lo] = value.to_be_bytes();
        self.write_byte_hex(hi, None);
        self.write_byte_hex(lo, separator);
    }

    /// Writes a UTF-8 string in length-prefixed form: a `u16` byte count, then the bytes.
    ///
    /// An empty string is written as a zero length with no body.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        let len = u16::try_from(s.len()).map_err(|_| BufferError::StringTooLong { len: s.len() })?;
        self.write_u16(len);
        self.write_bytes(s.as_bytes());
        Ok(())
    }

    /// Writes the UTF-8 bytes of `s` with no length prefix. The reader must know the length,
    /// see [`read_string_exact`](Self::read_string_exact).
    pub fn write_string_raw(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Writes one byte of 8 flags. Element `i` becomes bit `i`, least significant first.
    pub fn write_flags(&mut self, flags: &[bool; 8]) {
        self.write_u8(pack_bits(flags.iter().copied()));
    }

    /// Writes a bit array of any length, 8 bits per byte, least significant bit first.
    ///
    /// The last byte is padded with zero bits. The length of the array is not written; write it
    /// separately if the reader does not know it.
    pub fn write_bit_array(&mut self, bits: &[bool]) {
        for chunk in bits.chunks(8) {
            self.write_u8(pack_bits(chunk.iter().copied()));
        }
    }

    /// Same as [`write_bit_array`](Self::write_bit_array), taking each bit as an integer. Any
    /// non-zero element is a set bit.
    pub fn write_bit_array_ints(&mut self, bits: &[u8]) {
        for chunk in bits.chunks(8) {
            self.write_u8(pack_bits(chunk.iter().map(|&b| b != 0)));
        }
    }

    /// Encodes a `u32` value using a variable-length encoding of 1 to 5 bytes.
    pub fn write_var_u32(&mut self, value: u32) {
        const MORE: u8 = 0x80;

        let mut buf = [0u8; 5];
        let mut len = 0;
        let mut n = value;
        loop {
            if n < 0x80 {
                buf[len] = n as u8;
                len += 1;
                break;
            }
            buf[len] = (n & 0x7f) as u8 | MORE;
            len += 1;
            n >>= 7;
        }
        self.write_bytes(&buf[..len]);
    }

    /// Encodes an `i32` value using a variable-length encoding of 1 to 5 bytes.
    ///
    /// The value is ZigZag-mapped first, so small negative values stay small: `0, -1, 1, -2`
    /// become `0, 1, 2, 3`.
    pub fn write_var_i32(&mut self, value: i32) {
        self.write_var_u32(((value << 1) ^ (value >> 31)) as u32);
    }

    /// Writes a double using 1, 2, 4 or 8 payload bytes, preceded by a width selector byte.
    ///
    /// The narrowest width that reproduces `value` exactly is chosen; see [`VarDouble::encode`].
    /// `signed` must be passed again to [`read_var_double`](Self::read_var_double).
    pub fn write_var_double(&mut self, value: f64, signed: bool) {
        let encoded = VarDouble::encode(value, signed);
        self.write_u8(encoded.selector());
        match encoded {
            VarDouble::I8(v) => self.write_i8(v),
            VarDouble::U8(v) => self.write_u8(v),
            VarDouble::Decimal16(word) => self.write_u16(word),
            VarDouble::Decimal32(word) => self.write_u32(word),
            VarDouble::Double(v) => self.write_f64(v),
        }
    }
}

fn pack_bits(bits: impl Iterator<Item = bool>) -> u8 {
    bits.take(8)
        .enumerate()
        .fold(0, |acc, (i, bit)| acc | (u8::from(bit) << i))
}
