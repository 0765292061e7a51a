use crate::core::ExceptionCode;

const EXCEPTION_FLAG: u8 = 0x80;

/// Inbound request PDU with the unit id of its frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub unit_id: u8,
    pub function_code: u8,
    pub data: Vec<u8>,
}

impl Message {
    pub fn new(unit_id: u8, function_code: u8, data: impl Into<Vec<u8>>) -> Self {
        Message {
            unit_id,
            function_code,
            data: data.into(),
        }
    }

    /// Splits a raw PDU (`[function_code][body...]`) into a message.
    /// Returns `None` for an empty PDU.
    pub fn from_pdu(unit_id: u8, pdu: &[u8]) -> Option<Self> {
        let (&function_code, data) = pdu.split_first()?;
        Some(Message::new(unit_id, function_code, data))
    }

    pub fn respond(&self, data: Vec<u8>, is_exception: bool) -> Response {
        Response {
            unit_id: self.unit_id,
            function_code: self.function_code,
            data,
            is_exception,
        }
    }

    pub fn respond_exception(&self, code: ExceptionCode) -> Response {
        self.respond(vec![code.into()], true)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub unit_id: u8,
    /// Function code of the request, without the exception flag.
    pub function_code: u8,
    pub data: Vec<u8>,
    pub is_exception: bool,
}

impl Response {
    /// Function code as sent on the wire.
    pub fn wire_function_code(&self) -> u8 {
        if self.is_exception {
            self.function_code | EXCEPTION_FLAG
        } else {
            self.function_code
        }
    }

    pub fn exception_code(&self) -> Option<u8> {
        if self.is_exception { self.data.first().copied() } else { None }
    }

    pub fn to_pdu(&self) -> Vec<u8> {
        let mut pdu = Vec::with_capacity(1 + self.data.len());
        pdu.push(self.wire_function_code());
        pdu.extend_from_slice(&self.data);
        pdu
    }
}
