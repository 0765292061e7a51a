//! Operation handlers, one per supported function code.
//!
//! Each handler validates its arguments, talks to the [`DataSource`] and
//! returns the response body (without the function code byte).

use crate::bits::{bytes_needed, pack_coils, unpack_coils};
use crate::codec::{
    AddressQuantity, AddressValue, MultiWriteHeader, decode_registers, encode_registers,
};
use crate::core::{
    COIL_ON, MAX_READ_COILS, MAX_READ_REGISTERS, MAX_WRITE_COILS, MAX_WRITE_REGISTERS,
    ModbusRequestError, check_range,
};
use crate::store::DataSource;

fn addresses(address: u16, quantity: u16) -> impl Iterator<Item = u16> {
    (0..quantity).map(move |offset| address + offset)
}

fn read_bits<D, F>(
    source: &D,
    unit_id: u8,
    args: AddressQuantity,
    get: F,
) -> Result<Vec<u8>, ModbusRequestError>
where
    D: DataSource + ?Sized,
    F: Fn(&D, u8, u16) -> Result<bool, ModbusRequestError>,
{
    check_range(args.address, args.quantity, MAX_READ_COILS)?;
    let coils = addresses(args.address, args.quantity)
        .map(|address| get(source, unit_id, address))
        .collect::<Result<Vec<_>, _>>()?;

    let packed = pack_coils(&coils);
    let mut body = Vec::with_capacity(1 + packed.len());
    body.push(packed.len() as u8);
    body.extend(packed);
    Ok(body)
}

fn read_words<D, F>(
    source: &D,
    unit_id: u8,
    args: AddressQuantity,
    get: F,
) -> Result<Vec<u8>, ModbusRequestError>
where
    D: DataSource + ?Sized,
    F: Fn(&D, u8, u16) -> Result<u16, ModbusRequestError>,
{
    check_range(args.address, args.quantity, MAX_READ_REGISTERS)?;
    let values = addresses(args.address, args.quantity)
        .map(|address| get(source, unit_id, address))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(encode_registers(&values))
}

/// 0x01
pub fn read_coils<D: DataSource + ?Sized>(
    source: &D,
    unit_id: u8,
    args: AddressQuantity,
) -> Result<Vec<u8>, ModbusRequestError> {
    read_bits(source, unit_id, args, D::get_coil)
}

/// 0x02
pub fn read_discrete_inputs<D: DataSource + ?Sized>(
    source: &D,
    unit_id: u8,
    args: AddressQuantity,
) -> Result<Vec<u8>, ModbusRequestError> {
    read_bits(source, unit_id, args, D::get_discrete_input)
}

/// 0x03
pub fn read_holding_registers<D: DataSource + ?Sized>(
    source: &D,
    unit_id: u8,
    args: AddressQuantity,
) -> Result<Vec<u8>, ModbusRequestError> {
    read_words(source, unit_id, args, D::get_holding_register)
}

/// 0x04
pub fn read_input_registers<D: DataSource + ?Sized>(
    source: &D,
    unit_id: u8,
    args: AddressQuantity,
) -> Result<Vec<u8>, ModbusRequestError> {
    read_words(source, unit_id, args, D::get_analog_input)
}

/// 0x05. The value has already been checked to be `0x0000` or `0xFF00` by
/// the request decoder; anything but `0xFF00` is written as off.
pub fn write_single_coil<D: DataSource + ?Sized>(
    source: &D,
    unit_id: u8,
    args: AddressValue,
) -> Result<Vec<u8>, ModbusRequestError> {
    source.set_coil(unit_id, args.address, args.value == COIL_ON)?;
    Ok(args.encode())
}

/// 0x06
pub fn write_single_register<D: DataSource + ?Sized>(
    source: &D,
    unit_id: u8,
    args: AddressValue,
) -> Result<Vec<u8>, ModbusRequestError> {
    source.set_holding_register(unit_id, args.address, args.value)?;
    Ok(args.encode())
}

/// 0x0F
pub fn write_multiple_coils<D: DataSource + ?Sized>(
    source: &D,
    unit_id: u8,
    data: &[u8],
) -> Result<Vec<u8>, ModbusRequestError> {
    let (header, payload) = MultiWriteHeader::split(data)?;
    header.check_byte_count(bytes_needed(header.quantity as usize))?;
    check_range(header.address, header.quantity, MAX_WRITE_COILS)?;

    let coils = unpack_coils(payload, header.quantity as usize).ok_or(
        ModbusRequestError::InvalidFrame {
            expected: bytes_needed(header.quantity as usize),
            actual: payload.len(),
        },
    )?;

    // read every target first so a bad range leaves the store untouched
    for address in addresses(header.address, header.quantity) {
        source.get_coil(unit_id, address)?;
    }
    for (address, coil) in addresses(header.address, header.quantity).zip(coils) {
        source.set_coil(unit_id, address, coil)?;
    }

    Ok(AddressQuantity {
        address: header.address,
        quantity: header.quantity,
    }
    .encode())
}

/// 0x10
pub fn write_multiple_registers<D: DataSource + ?Sized>(
    source: &D,
    unit_id: u8,
    data: &[u8],
) -> Result<Vec<u8>, ModbusRequestError> {
    let (header, payload) = MultiWriteHeader::split(data)?;
    header.check_byte_count(header.quantity as usize * 2)?;
    check_range(header.address, header.quantity, MAX_WRITE_REGISTERS)?;

    let values = decode_registers(payload)?;

    for address in addresses(header.address, header.quantity) {
        source.get_holding_register(unit_id, address)?;
    }
    for (address, value) in addresses(header.address, header.quantity).zip(values) {
        source.set_holding_register(unit_id, address, value)?;
    }

    Ok(AddressQuantity {
        address: header.address,
        quantity: header.quantity,
    }
    .encode())
}
