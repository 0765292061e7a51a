use std::sync::Arc;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::core::{ExceptionCode, FunctionCode, ModbusRequestError};
use crate::handlers;
use crate::message::{Message, Response};
use crate::request::Request;
use crate::store::DataSource;

/// What to do with a request whose declared and actual lengths disagree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingPolicy {
    /// Return the framing error to the caller, which should drop the connection.
    #[default]
    Propagate,
    /// Answer with exception code 0x03 (Illegal Data Value).
    IllegalDataValue,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub framing_policy: FramingPolicy,
}

/// Stateless request processor over a shared data source.
///
/// Holds no mutable state of its own; concurrent use is as safe as the
/// data source's `get`/`set` calls.
pub struct RequestProcessor<D: DataSource + ?Sized> {
    source: Arc<D>,
    config: ProcessorConfig,
}

impl<D: DataSource + ?Sized> RequestProcessor<D> {
    pub fn new(source: Arc<D>) -> Self {
        Self::with_config(source, ProcessorConfig::default())
    }

    pub fn with_config(source: Arc<D>, config: ProcessorConfig) -> Self {
        RequestProcessor { source, config }
    }

    pub fn data_source(&self) -> &Arc<D> {
        &self.source
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Processes one request.
    ///
    /// Protocol errors become exception responses. Framing errors are
    /// returned as `Err(InvalidFrame)` unless the configured
    /// [`FramingPolicy`] turns them into exception responses as well.
    pub fn process(&self, message: &Message) -> Result<Response, ModbusRequestError> {
        match FunctionCode::try_from(message.function_code) {
            Ok(fc) => debug!(
                "unit {}: function {:#04x} on {:?}, {} byte body",
                message.unit_id,
                message.function_code,
                fc.register_type(),
                message.data.len()
            ),
            Err(_) => debug!(
                "unit {}: unsupported function {:#04x}",
                message.unit_id, message.function_code
            ),
        }

        match self.execute(message) {
            Ok(body) => Ok(message.respond(body, false)),
            Err(err) => match err.exception_code() {
                Some(code) => {
                    warn!(
                        "unit {}: function {:#04x} answered with exception {:#04x}: {}",
                        message.unit_id,
                        message.function_code,
                        u8::from(code),
                        err
                    );
                    Ok(message.respond_exception(code))
                }
                None => self.framing_failure(message, err),
            },
        }
    }

    fn execute(&self, message: &Message) -> Result<Vec<u8>, ModbusRequestError> {
        let source = self.source.as_ref();
        let unit_id = message.unit_id;
        match Request::parse(message.function_code, &message.data)? {
            Request::ReadCoils(args) => handlers::read_coils(source, unit_id, args),
            Request::ReadDiscreteInputs(args) => {
                handlers::read_discrete_inputs(source, unit_id, args)
            }
            Request::ReadHoldingRegisters(args) => {
                handlers::read_holding_registers(source, unit_id, args)
            }
            Request::ReadInputRegisters(args) => {
                handlers::read_input_registers(source, unit_id, args)
            }
            Request::WriteSingleCoil(args) => handlers::write_single_coil(source, unit_id, args),
            Request::WriteSingleRegister(args) => {
                handlers::write_single_register(source, unit_id, args)
            }
            Request::WriteMultipleCoils(data) => {
                handlers::write_multiple_coils(source, unit_id, data)
            }
            Request::WriteMultipleRegisters(data) => {
                handlers::write_multiple_registers(source, unit_id, data)
            }
        }
    }

    fn framing_failure(
        &self,
        message: &Message,
        err: ModbusRequestError,
    ) -> Result<Response, ModbusRequestError> {
        match self.config.framing_policy {
            FramingPolicy::Propagate => {
                error!(
                    "unit {}: malformed function {:#04x} request: {}",
                    message.unit_id, message.function_code, err
                );
                Err(err)
            }
            FramingPolicy::IllegalDataValue => {
                warn!(
                    "unit {}: malformed function {:#04x} request answered as illegal value: {}",
                    message.unit_id, message.function_code, err
                );
                Ok(message.respond_exception(ExceptionCode::IllegalDataValue))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_propagates() {
        assert_eq!(ProcessorConfig::default().framing_policy, FramingPolicy::Propagate);
    }

    #[test]
    fn config_from_json() {
        let config: ProcessorConfig =
            serde_json::from_str(r#"{ "framing_policy": "illegal_data_value" }"#).unwrap();
        assert_eq!(config.framing_policy, FramingPolicy::IllegalDataValue);

        let config: ProcessorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProcessorConfig::default());
    }
}
