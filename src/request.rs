//! Function dispatch table.
//!
//! Each supported function code maps to one variant carrying its decoded
//! arguments. The two multiple write functions keep their raw body, which the
//! handler parses itself since its length is self-describing.

use crate::codec::{AddressQuantity, AddressValue};
use crate::core::{COIL_OFF, COIL_ON, FunctionCode, ModbusRequestError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request<'a> {
    ReadCoils(AddressQuantity),
    ReadDiscreteInputs(AddressQuantity),
    ReadHoldingRegisters(AddressQuantity),
    ReadInputRegisters(AddressQuantity),
    WriteSingleCoil(AddressValue),
    WriteSingleRegister(AddressValue),
    WriteMultipleCoils(&'a [u8]),
    WriteMultipleRegisters(&'a [u8]),
}

impl<'a> Request<'a> {
    /// Looks up `function_code` and decodes the fixed-format arguments.
    ///
    /// Unknown codes fail with `IllegalFunction`, bodies of the wrong length
    /// with `InvalidFrame`, single coil values other than `0x0000`/`0xFF00`
    /// with `IllegalValue`.
    pub fn parse(function_code: u8, data: &'a [u8]) -> Result<Self, ModbusRequestError> {
        let fc = FunctionCode::try_from(function_code)?;
        let request = match fc {
            FunctionCode::ReadCoils => Request::ReadCoils(AddressQuantity::decode(data)?),
            FunctionCode::ReadDiscreteInputs => {
                Request::ReadDiscreteInputs(AddressQuantity::decode(data)?)
            }
            FunctionCode::ReadHoldingRegisters => {
                Request::ReadHoldingRegisters(AddressQuantity::decode(data)?)
            }
            FunctionCode::ReadInputRegisters => {
                Request::ReadInputRegisters(AddressQuantity::decode(data)?)
            }
            FunctionCode::WriteSingleCoil => {
                let args = AddressValue::decode(data)?;
                if args.value != COIL_ON && args.value != COIL_OFF {
                    return Err(ModbusRequestError::IllegalValue(args.value));
                }
                Request::WriteSingleCoil(args)
            }
            FunctionCode::WriteSingleRegister => {
                Request::WriteSingleRegister(AddressValue::decode(data)?)
            }
            FunctionCode::WriteMultipleCoils => Request::WriteMultipleCoils(data),
            FunctionCode::WriteMultipleRegisters => Request::WriteMultipleRegisters(data),
        };
        Ok(request)
    }

    pub fn function_code(&self) -> FunctionCode {
        match self {
            Request::ReadCoils(_) => FunctionCode::ReadCoils,
            Request::ReadDiscreteInputs(_) => FunctionCode::ReadDiscreteInputs,
            Request::ReadHoldingRegisters(_) => FunctionCode::ReadHoldingRegisters,
            Request::ReadInputRegisters(_) => FunctionCode::ReadInputRegisters,
            Request::WriteSingleCoil(_) => FunctionCode::WriteSingleCoil,
            Request::WriteSingleRegister(_) => FunctionCode::WriteSingleRegister,
            Request::WriteMultipleCoils(_) => FunctionCode::WriteMultipleCoils,
            Request::WriteMultipleRegisters(_) => FunctionCode::WriteMultipleRegisters,
        }
    }
}
