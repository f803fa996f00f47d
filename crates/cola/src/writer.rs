//! Builder producing wire-ready command bodies.

use crate::command::{CoLaCommand, CommandKind};
use codec::endian;
use md5::{Digest, Md5};

/// Builds a command body: tag, space, name, space, then appended
/// parameters in command byte order.
pub struct CoLaParameterWriter {
    buffer: Vec<u8>,
}

impl CoLaParameterWriter {
    pub fn new(kind: CommandKind, name: &str) -> Self {
        let mut writer = CoLaParameterWriter { buffer: Vec::new() };
        if let Some(tag) = kind.tag() {
            writer.buffer.extend_from_slice(tag);
            if kind == CommandKind::Error {
                return writer;
            }
            writer.buffer.push(b' ');
            writer.buffer.extend_from_slice(name.as_bytes());
            writer.buffer.push(b' ');
        }
        writer
    }

    pub fn parameter_i8(mut self, value: i8) -> Self {
        self.buffer.push(value as u8);
        self
    }

    pub fn parameter_u8(mut self, value: u8) -> Self {
        self.buffer.push(value);
        self
    }

    pub fn parameter_i16(mut self, value: i16) -> Self {
        endian::write_cola(&mut self.buffer, value);
        self
    }

    pub fn parameter_u16(mut self, value: u16) -> Self {
        endian::write_cola(&mut self.buffer, value);
        self
    }

    pub fn parameter_i32(mut self, value: i32) -> Self {
        endian::write_cola(&mut self.buffer, value);
        self
    }

    pub fn parameter_u32(mut self, value: u32) -> Self {
        endian::write_cola(&mut self.buffer, value);
        self
    }

    pub fn parameter_f32(mut self, value: f32) -> Self {
        endian::write_cola(&mut self.buffer, value);
        self
    }

    pub fn parameter_f64(mut self, value: f64) -> Self {
        endian::write_cola(&mut self.buffer, value);
        self
    }

    pub fn parameter_bool(self, value: bool) -> Self {
        self.parameter_u8(u8::from(value))
    }

    /// Flex string: 16-bit length prefix followed by the raw bytes, no
    /// terminator.
    pub fn parameter_flex_string(mut self, value: &str) -> Self {
        endian::write_cola(&mut self.buffer, value.len() as u16);
        self.buffer.extend_from_slice(value.as_bytes());
        self
    }

    /// Legacy password hash: MD5 of the password folded to 32 bits by
    /// XORing the four digest quarters byte by byte.
    pub fn parameter_password_md5(self, password: &str) -> Self {
        let digest = Md5::digest(password.as_bytes());
        let mut folded = [0u8; 4];
        for (i, slot) in folded.iter_mut().enumerate() {
            *slot = digest[i] ^ digest[i + 4] ^ digest[i + 8] ^ digest[i + 12];
        }
        self.parameter_u32(u32::from_le_bytes(folded))
    }

    pub fn build(self) -> CoLaCommand {
        CoLaCommand::from_buffer(self.buffer)
    }
}
