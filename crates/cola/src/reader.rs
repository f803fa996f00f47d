//! Cursor over a command's parameter bytes.

use crate::command::CoLaCommand;
use codec::endian;
use codec::error::Result;

/// Reads typed parameters from a command, advancing by the fixed width of
/// each primitive.
pub struct CoLaParameterReader<'a> {
    command: &'a CoLaCommand,
    position: usize,
}

impl<'a> CoLaParameterReader<'a> {
    pub fn new(command: &'a CoLaCommand) -> Self {
        CoLaParameterReader {
            command,
            position: command.parameter_offset(),
        }
    }

    /// Reset the cursor to the first parameter.
    pub fn rewind(&mut self) {
        self.position = self.command.parameter_offset();
    }

    fn read_scalar<T: codec::Scalar>(&mut self) -> Result<T> {
        let value = endian::read_cola::<T>(self.command.buffer(), self.position)?;
        self.position += T::SIZE;
        Ok(value)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_scalar()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_scalar()
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_scalar()
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_scalar()
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_scalar()
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_scalar()
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_scalar()
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_scalar()
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? == 1)
    }

    /// Flex string: 16-bit length prefix, then that many UTF-8 bytes.
    pub fn read_flex_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let buffer = self.command.buffer();
        if self.position + len > buffer.len() {
            return Err(codec::CodecError::OutOfBounds {
                offset: self.position,
                needed: len,
                available: buffer.len(),
            });
        }
        let value = String::from_utf8(buffer[self.position..self.position + len].to_vec())?;
        self.position += len;
        Ok(value)
    }
}
