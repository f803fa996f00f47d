//! Little-endian encode/decode over `bytes` buffers.
//!
//! Blob segment payloads are little-endian throughout; composite records
//! implement `Wire` field by field instead of reinterpreting packed structs
//! through pointer casts.

use crate::error::{CodecError, Result};
use bytes::{Buf, BufMut};

/// A value with a little-endian wire form.
pub trait Wire: Sized {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()>;
    fn decode<B: Buf>(buf: &mut B) -> Result<Self>;

    /// Encoded size in bytes.
    fn wire_size(&self) -> usize;
}

macro_rules! impl_wire_scalar {
    ($ty:ty, $put:ident, $get:ident, $size:expr) => {
        impl Wire for $ty {
            fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
                if buf.remaining_mut() < $size {
                    return Err(CodecError::insufficient(
                        stringify!($ty),
                        $size,
                        buf.remaining_mut(),
                    ));
                }
                buf.$put(*self);
                Ok(())
            }

            fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
                if buf.remaining() < $size {
                    return Err(CodecError::insufficient(
                        stringify!($ty),
                        $size,
                        buf.remaining(),
                    ));
                }
                Ok(buf.$get())
            }

            fn wire_size(&self) -> usize {
                $size
            }
        }
    };
}

impl_wire_scalar!(u8, put_u8, get_u8, 1);
impl_wire_scalar!(i8, put_i8, get_i8, 1);
impl_wire_scalar!(u16, put_u16_le, get_u16_le, 2);
impl_wire_scalar!(i16, put_i16_le, get_i16_le, 2);
impl_wire_scalar!(u32, put_u32_le, get_u32_le, 4);
impl_wire_scalar!(i32, put_i32_le, get_i32_le, 4);
impl_wire_scalar!(u64, put_u64_le, get_u64_le, 8);
impl_wire_scalar!(i64, put_i64_le, get_i64_le, 8);
impl_wire_scalar!(f32, put_f32_le, get_f32_le, 4);
impl_wire_scalar!(f64, put_f64_le, get_f64_le, 8);

impl Wire for bool {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        u8::from(*self).encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(u8::decode(buf)? != 0)
    }

    fn wire_size(&self) -> usize {
        1
    }
}

impl<T: Wire + Default + Copy, const N: usize> Wire for [T; N] {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        for item in self {
            item.encode(buf)?;
        }
        Ok(())
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let mut array = [T::default(); N];
        for slot in &mut array {
            *slot = T::decode(buf)?;
        }
        Ok(array)
    }

    fn wire_size(&self) -> usize {
        self.iter().map(Wire::wire_size).sum()
    }
}
