//! In-memory hardware model consumed by the generators.
//!
//! The tree is produced by [`crate::load`] and is never mutated by the
//! generators afterwards: `Device` → `Peripheral` → `Register` → `Field` →
//! `EnumeratedValue`.

/// A whole chip
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub description: Option<String>,
    pub peripherals: Vec<Peripheral>,
}

/// A named, base-addressed hardware block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Peripheral {
    pub name: String,
    pub base_address: u32,
    pub description: Option<String>,
    /// Prefix prepended to every constant emitted for this peripheral
    pub prepend_to_name: Option<String>,
    /// Registers in declaration order, not necessarily sorted by offset
    pub registers: Vec<Register>,
}

/// A 32-bit addressable location
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Register {
    /// May carry an index token such as `[0]` when the register is part
    /// of a same-named family
    pub name: String,
    pub address_offset: u32,
    pub description: Option<String>,
    pub alternate_group: Option<String>,
    pub fields: Vec<Field>,
}

/// A bit range within a register
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub bit_offset: u8,
    pub bit_width: u8,
    pub description: Option<String>,
    pub enumerated_values: Vec<EnumeratedValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnumeratedValue {
    pub name: String,
    pub value: u64,
    pub description: Option<String>,
}

impl Device {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_peripheral(mut self, peripheral: Peripheral) -> Self {
        self.peripherals.push(peripheral);
        self
    }
}

impl Peripheral {
    pub fn new(name: &str, base_address: u32) -> Self {
        Self {
            name: name.to_string(),
            base_address,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_prepend_to_name(mut self, prefix: &str) -> Self {
        self.prepend_to_name = Some(prefix.to_string());
        self
    }

    pub fn with_register(mut self, register: Register) -> Self {
        self.registers.push(register);
        self
    }

    /// Registers ordered by address offset.
    ///
    /// The sort is stable, so registers sharing an offset keep their
    /// declaration order.
    pub fn sorted_registers(&self) -> Vec<&Register> {
        let mut registers: Vec<&Register> = self.registers.iter().collect();
        registers.sort_by_key(|r| r.address_offset);
        registers
    }

    /// Absolute address of `register` within this peripheral
    pub fn address_of(&self, register: &Register) -> u32 {
        self.base_address.wrapping_add(register.address_offset)
    }
}

impl Register {
    pub fn new(name: &str, address_offset: u32) -> Self {
        Self {
            name: name.to_string(),
            address_offset,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_alternate_group(mut self, group: &str) -> Self {
        self.alternate_group = Some(group.to_string());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

impl Field {
    pub fn new(name: &str, bit_offset: u8, bit_width: u8) -> Self {
        Self {
            name: name.to_string(),
            bit_offset,
            bit_width,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_value(mut self, value: EnumeratedValue) -> Self {
        self.enumerated_values.push(value);
        self
    }
}

impl EnumeratedValue {
    pub fn new(name: &str, value: u64) -> Self {
        Self {
            name: name.to_string(),
            value,
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}
