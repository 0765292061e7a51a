use thiserror::Error;

pub const COIL_ON: u16 = 0xFF00;
pub const COIL_OFF: u16 = 0x0000;

pub const MAX_READ_COILS: u16 = 2000;
pub const MAX_READ_REGISTERS: u16 = 125;
pub const MAX_WRITE_COILS: u16 = 1968;
pub const MAX_WRITE_REGISTERS: u16 = 123;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModbusRequestError {
    #[error("Illegal function: {0:#04x}")]
    IllegalFunction(u8),

    #[error("Illegal data address: {address} (+{quantity})")]
    IllegalAddress { address: u16, quantity: u16 },

    #[error("Illegal data value: {0:#06x}")]
    IllegalValue(u16),

    #[error("Invalid frame: expected {expected} bytes, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },

    #[error("Gateway path unavailable")]
    GatewayPathUnavailable,

    #[error("Gateway target device failed to respond")]
    GatewayTargetDeviceFailedToRespond,
}

impl ModbusRequestError {
    pub fn illegal_address(address: u16) -> Self {
        ModbusRequestError::IllegalAddress { address, quantity: 1 }
    }

    /// Exception code answered to the requester. `None` means the request is
    /// structurally corrupt and gets no Modbus answer.
    pub fn exception_code(&self) -> Option<ExceptionCode> {
        match self {
            ModbusRequestError::IllegalFunction(_) => Some(ExceptionCode::IllegalFunction),
            ModbusRequestError::IllegalAddress { .. } => Some(ExceptionCode::IllegalDataAddress),
            ModbusRequestError::IllegalValue(_) => Some(ExceptionCode::IllegalDataValue),
            ModbusRequestError::GatewayPathUnavailable => Some(ExceptionCode::GatewayPathUnavailable),
            ModbusRequestError::GatewayTargetDeviceFailedToRespond => {
                Some(ExceptionCode::GatewayTargetDeviceFailedToRespond)
            }
            ModbusRequestError::InvalidFrame { .. } => None,
        }
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExceptionCode {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
    IllegalDataValue = 0x03,
    GatewayPathUnavailable = 0x0A,
    GatewayTargetDeviceFailedToRespond = 0x0B,
}

impl From<ExceptionCode> for u8 {
    fn from(code: ExceptionCode) -> u8 {
        code as u8
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegisterType {
    CoilRegister,
    DiscreteRegister,
    HoldingRegister,
    InputRegister,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionCode {
    ReadCoils,
    ReadDiscreteInputs,
    ReadHoldingRegisters,
    ReadInputRegisters,
    WriteSingleCoil,
    WriteSingleRegister,
    WriteMultipleCoils,
    WriteMultipleRegisters,
}

impl FunctionCode {
    pub fn code(self) -> u8 {
        match self {
            FunctionCode::ReadCoils => 0x01,
            FunctionCode::ReadDiscreteInputs => 0x02,
            FunctionCode::ReadHoldingRegisters => 0x03,
            FunctionCode::ReadInputRegisters => 0x04,
            FunctionCode::WriteSingleCoil => 0x05,
            FunctionCode::WriteSingleRegister => 0x06,
            FunctionCode::WriteMultipleCoils => 0x0F,
            FunctionCode::WriteMultipleRegisters => 0x10,
        }
    }

    /// Register class the function operates on.
    pub fn register_type(self) -> RegisterType {
        match self {
            FunctionCode::ReadCoils
            | FunctionCode::WriteSingleCoil
            | FunctionCode::WriteMultipleCoils => RegisterType::CoilRegister,
            FunctionCode::ReadDiscreteInputs => RegisterType::DiscreteRegister,
            FunctionCode::ReadHoldingRegisters
            | FunctionCode::WriteSingleRegister
            | FunctionCode::WriteMultipleRegisters => RegisterType::HoldingRegister,
            FunctionCode::ReadInputRegisters => RegisterType::InputRegister,
        }
    }
}

impl TryFrom<u8> for FunctionCode {
    type Error = ModbusRequestError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let fc = match code {
            0x01 => FunctionCode::ReadCoils,
            0x02 => FunctionCode::ReadDiscreteInputs,
            0x03 => FunctionCode::ReadHoldingRegisters,
            0x04 => FunctionCode::ReadInputRegisters,
            0x05 => FunctionCode::WriteSingleCoil,
            0x06 => FunctionCode::WriteSingleRegister,
            0x0F => FunctionCode::WriteMultipleCoils,
            0x10 => FunctionCode::WriteMultipleRegisters,
            _ => return Err(ModbusRequestError::IllegalFunction(code)),
        };
        Ok(fc)
    }
}

/// Checks that `quantity` items starting at `address` fit into the 16-bit
/// address space and that the quantity is within `1..=max`.
pub fn check_range(address: u16, quantity: u16, max: u16) -> Result<(), ModbusRequestError> {
    if quantity == 0 || quantity > max {
        return Err(ModbusRequestError::IllegalValue(quantity));
    }
    if address as u32 + quantity as u32 > 0x1_0000 {
        return Err(ModbusRequestError::IllegalAddress { address, quantity });
    }
    Ok(())
}
