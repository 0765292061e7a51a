use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;

use crate::core::{ModbusRequestError, RegisterType};

/// Register/coil store consumed by the request processor.
///
/// Every call addresses a single cell by `(unit_id, address)` and must be
/// atomic on its own. A missing cell is reported as
/// [`ModbusRequestError::IllegalAddress`]. Proxying implementations report
/// downstream failures with the two gateway variants.
///
/// Multiple write requests read every target cell before writing any of
/// them, so a failing getter rejects the whole write. Gateway-backed
/// sources see one downstream read per target before the writes.
pub trait DataSource: Send + Sync {
    fn get_holding_register(&self, unit_id: u8, address: u16) -> Result<u16, ModbusRequestError>;
    fn get_analog_input(&self, unit_id: u8, address: u16) -> Result<u16, ModbusRequestError>;
    fn get_coil(&self, unit_id: u8, address: u16) -> Result<bool, ModbusRequestError>;
    fn get_discrete_input(&self, unit_id: u8, address: u16) -> Result<bool, ModbusRequestError>;
    fn set_coil(&self, unit_id: u8, address: u16, value: bool) -> Result<(), ModbusRequestError>;
    fn set_holding_register(
        &self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> Result<(), ModbusRequestError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModbusStoreError {
    #[error("Range of {0:?} for unit {1} is empty")]
    EmptyRange(RegisterType, u8),

    #[error("Invalid range: {0} + {1} = {2} > 65536")]
    RangeOverflow(u16, u16, u32),

    #[error("Unit ID not set before {0:?} range")]
    UnitIdMissing(RegisterType),

    #[error("{0:?} range for unit {1} declared twice")]
    DuplicateRange(RegisterType, u8),
}

struct Table<T> {
    start: u16,
    len: usize,
    values: RwLock<Vec<T>>,
}

impl<T: Copy + Default> Table<T> {
    fn new(start: u16, length: u16) -> Self {
        Table {
            start,
            len: length as usize,
            values: RwLock::new(vec![T::default(); length as usize]),
        }
    }

    fn index(&self, address: u16) -> Option<usize> {
        let offset = address.checked_sub(self.start)? as usize;
        (offset < self.len).then_some(offset)
    }

    fn get(&self, address: u16) -> Option<T> {
        let index = self.index(address)?;
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.get(index).copied()
    }

    fn set(&self, address: u16, value: T) -> Option<()> {
        let index = self.index(address)?;
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        *values.get_mut(index)? = value;
        Some(())
    }
}

/// Fills an empty slot; returns `true` if the slot was already taken.
fn fill_slot<T: Copy + Default>(slot: &mut Option<Table<T>>, start: u16, length: u16) -> bool {
    if slot.is_some() {
        return true;
    }
    *slot = Some(Table::new(start, length));
    false
}

#[derive(Default)]
struct UnitTables {
    coils: Option<Table<bool>>,
    discrete_inputs: Option<Table<bool>>,
    holding_registers: Option<Table<u16>>,
    input_registers: Option<Table<u16>>,
}

#[derive(Clone, Copy)]
struct RangeDecl {
    unit_id: u8,
    register_type: RegisterType,
    start: u16,
    length: u16,
}

pub struct MemoryDataSourceBuilder {
    current_unit: Option<u8>,
    ranges: Vec<RangeDecl>,
    errors: Vec<ModbusStoreError>,
}

impl MemoryDataSourceBuilder {
    /// Following range calls apply to this unit.
    pub fn unit(mut self, unit_id: u8) -> Self {
        self.current_unit = Some(unit_id);
        self
    }

    pub fn coils(self, start: u16, length: u16) -> Self {
        self.range(RegisterType::CoilRegister, start, length)
    }

    pub fn discrete_inputs(self, start: u16, length: u16) -> Self {
        self.range(RegisterType::DiscreteRegister, start, length)
    }

    pub fn holding_registers(self, start: u16, length: u16) -> Self {
        self.range(RegisterType::HoldingRegister, start, length)
    }

    pub fn input_registers(self, start: u16, length: u16) -> Self {
        self.range(RegisterType::InputRegister, start, length)
    }

    fn range(mut self, register_type: RegisterType, start: u16, length: u16) -> Self {
        match self.current_unit {
            Some(unit_id) => self.ranges.push(RangeDecl {
                unit_id,
                register_type,
                start,
                length,
            }),
            None => self.errors.push(ModbusStoreError::UnitIdMissing(register_type)),
        }
        self
    }

    pub fn build(mut self) -> Result<MemoryDataSource, ModbusStoreError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }

        let mut units: HashMap<u8, UnitTables> = HashMap::new();
        for decl in self.ranges {
            if decl.length == 0 {
                return Err(ModbusStoreError::EmptyRange(decl.register_type, decl.unit_id));
            }
            let end_addr = decl.start as u32 + decl.length as u32;
            if end_addr > 0x1_0000 {
                return Err(ModbusStoreError::RangeOverflow(decl.start, decl.length, end_addr));
            }

            let tables = units.entry(decl.unit_id).or_default();
            let taken = match decl.register_type {
                RegisterType::CoilRegister => {
                    fill_slot(&mut tables.coils, decl.start, decl.length)
                }
                RegisterType::DiscreteRegister => {
                    fill_slot(&mut tables.discrete_inputs, decl.start, decl.length)
                }
                RegisterType::HoldingRegister => {
                    fill_slot(&mut tables.holding_registers, decl.start, decl.length)
                }
                RegisterType::InputRegister => {
                    fill_slot(&mut tables.input_registers, decl.start, decl.length)
                }
            };
            if taken {
                return Err(ModbusStoreError::DuplicateRange(decl.register_type, decl.unit_id));
            }
        }
        Ok(MemoryDataSource { units })
    }
}

/// In-memory store with one contiguous, zero-initialised range per register
/// class and unit.
pub struct MemoryDataSource {
    units: HashMap<u8, UnitTables>,
}

impl MemoryDataSource {
    pub fn builder() -> MemoryDataSourceBuilder {
        MemoryDataSourceBuilder {
            current_unit: None,
            ranges: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn tables(&self, unit_id: u8, address: u16) -> Result<&UnitTables, ModbusRequestError> {
        self.units
            .get(&unit_id)
            .ok_or(ModbusRequestError::illegal_address(address))
    }

    /// Seeds an input register, which clients cannot write.
    pub fn set_analog_input(
        &self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> Result<(), ModbusRequestError> {
        self.tables(unit_id, address)?
            .input_registers
            .as_ref()
            .and_then(|table| table.set(address, value))
            .ok_or(ModbusRequestError::illegal_address(address))
    }

    /// Seeds a discrete input, which clients cannot write.
    pub fn set_discrete_input(
        &self,
        unit_id: u8,
        address: u16,
        value: bool,
    ) -> Result<(), ModbusRequestError> {
        self.tables(unit_id, address)?
            .discrete_inputs
            .as_ref()
            .and_then(|table| table.set(address, value))
            .ok_or(ModbusRequestError::illegal_address(address))
    }
}

impl DataSource for MemoryDataSource {
    fn get_holding_register(&self, unit_id: u8, address: u16) -> Result<u16, ModbusRequestError> {
        self.tables(unit_id, address)?
            .holding_registers
            .as_ref()
            .and_then(|table| table.get(address))
            .ok_or(ModbusRequestError::illegal_address(address))
    }

    fn get_analog_input(&self, unit_id: u8, address: u16) -> Result<u16, ModbusRequestError> {
        self.tables(unit_id, address)?
            .input_registers
            .as_ref()
            .and_then(|table| table.get(address))
            .ok_or(ModbusRequestError::illegal_address(address))
    }

    fn get_coil(&self, unit_id: u8, address: u16) -> Result<bool, ModbusRequestError> {
        self.tables(unit_id, address)?
            .coils
            .as_ref()
            .and_then(|table| table.get(address))
            .ok_or(ModbusRequestError::illegal_address(address))
    }

    fn get_discrete_input(&self, unit_id: u8, address: u16) -> Result<bool, ModbusRequestError> {
        self.tables(unit_id, address)?
            .discrete_inputs
            .as_ref()
            .and_then(|table| table.get(address))
            .ok_or(ModbusRequestError::illegal_address(address))
    }

    fn set_coil(&self, unit_id: u8, address: u16, value: bool) -> Result<(), ModbusRequestError> {
        self.tables(unit_id, address)?
            .coils
            .as_ref()
            .and_then(|table| table.set(address, value))
            .ok_or(ModbusRequestError::illegal_address(address))
    }

    fn set_holding_register(
        &self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> Result<(), ModbusRequestError> {
        self.tables(unit_id, address)?
            .holding_registers
            .as_ref()
            .and_then(|table| table.set(address, value))
            .ok_or(ModbusRequestError::illegal_address(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryDataSource {
        MemoryDataSource::builder()
            .unit(1)
            .holding_registers(100, 10)
            .coils(0, 16)
            .build()
            .unwrap()
    }

    #[test]
    fn cells_start_zeroed() {
        let store = store();
        assert_eq!(store.get_holding_register(1, 100), Ok(0));
        assert_eq!(store.get_coil(1, 15), Ok(false));
    }

    #[test]
    fn out_of_range_is_illegal_address() {
        let store = store();
        assert_eq!(
            store.get_holding_register(1, 99),
            Err(ModbusRequestError::illegal_address(99))
        );
        assert_eq!(
            store.get_holding_register(1, 110),
            Err(ModbusRequestError::illegal_address(110))
        );
        assert_eq!(
            store.get_holding_register(2, 100),
            Err(ModbusRequestError::illegal_address(100))
        );
        // class without a configured range
        assert_eq!(store.get_analog_input(1, 0), Err(ModbusRequestError::illegal_address(0)));
    }

    #[test]
    fn set_then_get() {
        let store = store();
        store.set_holding_register(1, 105, 0xBEEF).unwrap();
        store.set_coil(1, 3, true).unwrap();
        assert_eq!(store.get_holding_register(1, 105), Ok(0xBEEF));
        assert_eq!(store.get_coil(1, 3), Ok(true));
    }

    #[test]
    fn builder_rejects_overflowing_range() {
        let result = MemoryDataSource::builder().unit(1).holding_registers(0xFFF0, 0x20).build();
        assert!(matches!(result, Err(ModbusStoreError::RangeOverflow(0xFFF0, 0x20, 0x1_0010))));
    }

    #[test]
    fn builder_rejects_empty_range() {
        let result = MemoryDataSource::builder().unit(3).coils(0, 0).build();
        assert!(matches!(
            result,
            Err(ModbusStoreError::EmptyRange(RegisterType::CoilRegister, 3))
        ));
    }

    #[test]
    fn builder_rejects_duplicate_range() {
        let result = MemoryDataSource::builder()
            .unit(1)
            .holding_registers(0, 10)
            .holding_registers(100, 10)
            .build();
        assert!(matches!(
            result,
            Err(ModbusStoreError::DuplicateRange(RegisterType::HoldingRegister, 1))
        ));

        // same class on another unit is fine
        let store = MemoryDataSource::builder()
            .unit(1)
            .holding_registers(0, 10)
            .unit(2)
            .holding_registers(100, 10)
            .build()
            .unwrap();
        assert_eq!(store.get_holding_register(1, 0), Ok(0));
        assert_eq!(store.get_holding_register(2, 100), Ok(0));
    }

    #[test]
    fn builder_requires_unit() {
        let result = MemoryDataSource::builder().input_registers(0, 4).build();
        assert!(matches!(
            result,
            Err(ModbusStoreError::UnitIdMissing(RegisterType::InputRegister))
        ));
    }
}
