// lib.rs

pub mod bits;
pub mod codec;
mod core;
pub mod handlers;
mod message;
mod modbus_tcp;
mod processor;
mod request;
mod store;

pub use crate::core::{
    COIL_OFF, COIL_ON, ExceptionCode, FunctionCode, MAX_READ_COILS, MAX_READ_REGISTERS,
    MAX_WRITE_COILS, MAX_WRITE_REGISTERS, ModbusRequestError, RegisterType,
};
pub use crate::message::{Message, Response};
pub use crate::modbus_tcp::ModbusTcpServerUnit;
pub use crate::processor::{FramingPolicy, ProcessorConfig, RequestProcessor};
pub use crate::request::Request;
pub use crate::store::{DataSource, MemoryDataSource, MemoryDataSourceBuilder, ModbusStoreError};

#[derive(Debug, thiserror::Error)]
pub enum ModbusTransportError {
    #[error("Frame too short")]
    FrameTooShort,

    #[error("Invalid protocol ID: {0}")]
    InvalidProtocolId(u16),

    #[error("Length mismatch: header declares {declared}, frame carries {actual}")]
    LengthMismatch { declared: u16, actual: usize },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ModbusRequestError),
}
