//! Fixed-format argument structs carried in request and response bodies.
//!
//! Every struct has an exact wire length. Decoding a body of any other length
//! is a framing failure.

use crate::core::ModbusRequestError;

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    ((bytes[offset] as u16) << 8) | (bytes[offset + 1] as u16)
}

fn expect_len(bytes: &[u8], expected: usize) -> Result<(), ModbusRequestError> {
    if bytes.len() != expected {
        return Err(ModbusRequestError::InvalidFrame {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// `[address:u16][quantity:u16]`: read requests and multiple write replies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AddressQuantity {
    pub address: u16,
    pub quantity: u16,
}

impl AddressQuantity {
    pub const LEN: usize = 4;

    pub fn decode(bytes: &[u8]) -> Result<Self, ModbusRequestError> {
        expect_len(bytes, Self::LEN)?;
        Ok(AddressQuantity {
            address: read_u16(bytes, 0),
            quantity: read_u16(bytes, 2),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut msg = Vec::with_capacity(Self::LEN);
        msg.extend_from_slice(&self.address.to_be_bytes());
        msg.extend_from_slice(&self.quantity.to_be_bytes());
        msg
    }
}

/// `[address:u16][value:u16]`: single write requests and their echo.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AddressValue {
    pub address: u16,
    pub value: u16,
}

impl AddressValue {
    pub const LEN: usize = 4;

    pub fn decode(bytes: &[u8]) -> Result<Self, ModbusRequestError> {
        expect_len(bytes, Self::LEN)?;
        Ok(AddressValue {
            address: read_u16(bytes, 0),
            value: read_u16(bytes, 2),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut msg = Vec::with_capacity(Self::LEN);
        msg.extend_from_slice(&self.address.to_be_bytes());
        msg.extend_from_slice(&self.value.to_be_bytes());
        msg
    }
}

/// `[address:u16][quantity:u16][byte_count:u8]` followed by `byte_count`
/// payload bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MultiWriteHeader {
    pub address: u16,
    pub quantity: u16,
    pub byte_count: u8,
}

impl MultiWriteHeader {
    pub const LEN: usize = 5;

    /// Splits a multiple write body into its header and payload. The payload
    /// length must match the declared byte count exactly.
    pub fn split(bytes: &[u8]) -> Result<(Self, &[u8]), ModbusRequestError> {
        if bytes.len() < Self::LEN {
            return Err(ModbusRequestError::InvalidFrame {
                expected: Self::LEN,
                actual: bytes.len(),
            });
        }
        let header = MultiWriteHeader {
            address: read_u16(bytes, 0),
            quantity: read_u16(bytes, 2),
            byte_count: bytes[4],
        };
        let payload = &bytes[Self::LEN..];
        expect_len(payload, header.byte_count as usize)?;
        Ok((header, payload))
    }

    /// Fails unless the declared byte count is the one implied by `expected`.
    pub fn check_byte_count(&self, expected: usize) -> Result<(), ModbusRequestError> {
        if self.byte_count as usize != expected {
            return Err(ModbusRequestError::InvalidFrame {
                expected,
                actual: self.byte_count as usize,
            });
        }
        Ok(())
    }
}

/// Read response body for registers: byte count followed by big-endian values.
pub fn encode_registers(values: &[u16]) -> Vec<u8> {
    let mut body = Vec::with_capacity(1 + values.len() * 2);
    body.push((values.len() * 2) as u8);
    for value in values {
        body.extend_from_slice(&value.to_be_bytes());
    }
    body
}

/// Big-endian register payload of a multiple write request.
pub fn decode_registers(payload: &[u8]) -> Result<Vec<u16>, ModbusRequestError> {
    if payload.len() % 2 != 0 {
        return Err(ModbusRequestError::InvalidFrame {
            expected: payload.len() + 1,
            actual: payload.len(),
        });
    }
    Ok(payload.chunks_exact(2).map(|pair| read_u16(pair, 0)).collect())
}
