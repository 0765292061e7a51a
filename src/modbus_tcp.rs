use super::*;

const MBAP_HEADER_LEN: usize = 7;

/// Modbus TCP server side: strips the MBAP header from an incoming ADU,
/// runs the request processor and frames the answer with the same
/// transaction id and unit id.
pub struct ModbusTcpServerUnit<D: DataSource + ?Sized> {
    processor: RequestProcessor<D>,
}

impl<D: DataSource + ?Sized> ModbusTcpServerUnit<D> {
    pub fn new(processor: RequestProcessor<D>) -> Self {
        ModbusTcpServerUnit { processor }
    }

    pub fn processor(&self) -> &RequestProcessor<D> {
        &self.processor
    }

    /// Handle one complete request frame and return the response frame.
    ///
    /// Any error means the frame could not be trusted; the caller should
    /// close the connection.
    pub fn handle_frame(&self, frame: &[u8]) -> Result<Vec<u8>, ModbusTransportError> {
        let (transaction_id, message) = self.unwrap_tcp(frame)?;
        let response = self.processor.process(&message)?;
        Ok(Self::wrap_tcp(transaction_id, &response))
    }

    fn wrap_tcp(transaction_id: u16, response: &Response) -> Vec<u8> {
        let pdu = response.to_pdu();
        let length = (pdu.len() + 1) as u16;
        let mut frame = Vec::with_capacity(MBAP_HEADER_LEN + pdu.len());

        frame.extend_from_slice(&transaction_id.to_be_bytes());
        frame.push(0x00);
        frame.push(0x00);
        frame.extend_from_slice(&length.to_be_bytes());
        frame.push(response.unit_id);
        frame.extend(pdu);

        frame
    }

    fn unwrap_tcp(&self, frame: &[u8]) -> Result<(u16, Message), ModbusTransportError> {
        if frame.len() < MBAP_HEADER_LEN + 1 {
            return Err(ModbusTransportError::FrameTooShort);
        }

        let transaction_id = ((frame[0] as u16) << 8) | (frame[1] as u16);

        let protocol_id = ((frame[2] as u16) << 8) | (frame[3] as u16);
        if protocol_id != 0 {
            return Err(ModbusTransportError::InvalidProtocolId(protocol_id));
        }

        // length counts the unit id plus the PDU
        let length = ((frame[4] as u16) << 8) | (frame[5] as u16);
        let actual = frame.len() - 6;
        if length as usize != actual {
            return Err(ModbusTransportError::LengthMismatch {
                declared: length,
                actual,
            });
        }

        let unit_id = frame[6];
        let message = Message::from_pdu(unit_id, &frame[MBAP_HEADER_LEN..])
            .ok_or(ModbusTransportError::FrameTooShort)?;
        Ok((transaction_id, message))
    }
}
