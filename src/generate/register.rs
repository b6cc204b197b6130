use log::{debug, trace};

use crate::config::InstanceRule;
use crate::model::{Field, Peripheral, Register};
use crate::util;

/// Suffix of the mask constant of a multi-bit field
pub const MASK_SUFFIX: &str = "_Msk";

/// A named constant addressing one field by absolute address
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstantDirective {
    FieldMask {
        name: String,
        description: Option<String>,
        address: u32,
        bit_offset: u8,
        bit_width: u8,
    },
    FieldValue {
        name: String,
        description: Option<String>,
        address: u32,
        bit_offset: u8,
        bit_width: u8,
        value: u64,
    },
}

impl ConstantDirective {
    pub fn name(&self) -> &str {
        match self {
            Self::FieldMask { name, .. } | Self::FieldValue { name, .. } => name,
        }
    }
}

/// Constants of a single register, in field declaration order
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterConstants {
    /// Upper-cased register name as declared
    pub register: String,
    pub constants: Vec<ConstantDirective>,
}

/// Emits the field mask and value constants of `p`.
///
/// Registers are visited in offset order, alternate registers included.
/// Nothing is emitted when `rule` classifies `p` as a numbered instance,
/// and fields of registers past the first element of a family are left
/// out since they are only reachable through the struct layout.
pub fn render(p: &Peripheral, rule: InstanceRule) -> Vec<RegisterConstants> {
    if rule.is_instance(&p.name) {
        debug!("{} is a numbered instance, skipping constants", p.name);
        return Vec::new();
    }

    debug!("Emitting constants of {}", p.name);
    p.sorted_registers()
        .into_iter()
        .filter_map(|register| {
            let constants = register_constants(p, register);
            if constants.is_empty() {
                None
            } else {
                Some(RegisterConstants {
                    register: register.name.to_uppercase(),
                    constants,
                })
            }
        })
        .collect()
}

fn register_constants(p: &Peripheral, register: &Register) -> Vec<ConstantDirective> {
    let address = p.address_of(register);
    let mut out = Vec::new();
    for field in &register.fields {
        field_constants(p, register, field, address, &mut out);
    }
    out
}

fn field_constants(
    p: &Peripheral,
    register: &Register,
    field: &Field,
    address: u32,
    out: &mut Vec<ConstantDirective>,
) {
    let prefix = p.prepend_to_name.as_deref();
    let parts = [register.name.as_str(), field.name.as_str()];
    let Some(name) = util::constant_name(prefix, &parts) else {
        trace!("Unresolved index in {}.{}, skipping", register.name, field.name);
        return;
    };

    let mask = if field.bit_width > 1 { MASK_SUFFIX } else { "" };
    out.push(ConstantDirective::FieldMask {
        name: format!("{name}{mask}"),
        description: field.description.clone(),
        address,
        bit_offset: field.bit_offset,
        bit_width: field.bit_width,
    });

    for value in &field.enumerated_values {
        let parts = [register.name.as_str(), field.name.as_str(), value.name.as_str()];
        let Some(name) = util::constant_name(prefix, &parts) else {
            trace!(
                "Unresolved index in {}.{}.{}, skipping",
                register.name,
                field.name,
                value.name
            );
            continue;
        };
        out.push(ConstantDirective::FieldValue {
            name,
            description: value.description.clone(),
            address,
            bit_offset: field.bit_offset,
            bit_width: field.bit_width,
            value: value.value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EnumeratedValue;

    fn names(blocks: &[RegisterConstants]) -> Vec<&str> {
        blocks
            .iter()
            .flat_map(|b| b.constants.iter().map(ConstantDirective::name))
            .collect()
    }

    fn tc(name: &str) -> Peripheral {
        Peripheral::new(name, 0x4008_0000).with_register(
            Register::new("CMR", 4)
                .with_field(Field::new("CLKI", 3, 1))
                .with_field(Field::new("TCCLKS", 0, 3)),
        )
    }

    #[test]
    fn single_bit_field_has_no_mask_suffix() {
        let blocks = render(&tc("TC"), InstanceRule::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].register, "CMR");
        assert_eq!(
            blocks[0].constants[0],
            ConstantDirective::FieldMask {
                name: "CMR_CLKI".to_string(),
                description: None,
                address: 0x4008_0004,
                bit_offset: 3,
                bit_width: 1,
            }
        );
    }

    #[test]
    fn wide_field_has_mask_suffix() {
        let blocks = render(&tc("TC"), InstanceRule::default());
        assert_eq!(names(&blocks), ["CMR_CLKI", "CMR_TCCLKS_Msk"]);
    }

    #[test]
    fn numbered_instances_are_suppressed() {
        assert!(render(&tc("TC1"), InstanceRule::default()).is_empty());
        assert!(!render(&tc("TC"), InstanceRule::default()).is_empty());
        assert!(!render(&tc("TC1"), InstanceRule::Never).is_empty());
        assert!(!render(&tc("TC0"), InstanceRule::TrailingNonzeroDigit).is_empty());
    }

    #[test]
    fn enumerated_values() {
        let p = Peripheral::new("ADC", 0x400c_0000).with_register(
            Register::new("SR", 0x1c).with_field(
                Field::new("state", 4, 2)
                    .with_value(EnumeratedValue::new("IDLE", 0))
                    .with_value(EnumeratedValue::new("running", 2).with_description("Busy")),
            ),
        );
        let blocks = render(&p, InstanceRule::default());
        assert_eq!(
            names(&blocks),
            ["SR_STATE_Msk", "SR_STATE_IDLE", "SR_STATE_RUNNING"]
        );
        assert_eq!(
            blocks[0].constants[2],
            ConstantDirective::FieldValue {
                name: "SR_STATE_RUNNING".to_string(),
                description: Some("Busy".to_string()),
                address: 0x400c_001c,
                bit_offset: 4,
                bit_width: 2,
                value: 2,
            }
        );
    }

    #[test]
    fn prefix_override_is_prepended() {
        let p = tc("TC").with_prepend_to_name("TC_");
        assert_eq!(
            names(&render(&p, InstanceRule::default())),
            ["TC_CMR_CLKI", "TC_CMR_TCCLKS_Msk"]
        );
    }

    #[test]
    fn only_first_family_element_emits() {
        let p = Peripheral::new("PWM", 0x4009_4000)
            .with_register(Register::new("CMR[0]", 0x200).with_field(Field::new("CPRE", 0, 4)))
            .with_register(Register::new("CMR[1]", 0x204).with_field(Field::new("CPRE", 0, 4)));
        let blocks = render(&p, InstanceRule::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].register, "CMR[0]");
        assert_eq!(names(&blocks), ["CMR_CPRE_Msk"]);
    }

    #[test]
    fn registers_without_constants_are_omitted() {
        let p = Peripheral::new("UART", 0x400e_0800)
            .with_register(Register::new("THR", 0x1c))
            .with_register(Register::new("CR", 0).with_field(Field::new("RSTRX", 2, 1)));
        let blocks = render(&p, InstanceRule::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].register, "CR");
    }

    #[test]
    fn alternate_registers_emit_constants() {
        let p = Peripheral::new("USART", 0x4009_8000)
            .with_register(Register::new("MR", 4).with_field(Field::new("MODE", 0, 4)))
            .with_register(
                Register::new("MR_SPI", 4)
                    .with_alternate_group("SPI")
                    .with_field(Field::new("CPHA", 8, 1)),
            );
        assert_eq!(
            names(&render(&p, InstanceRule::default())),
            ["MR_MODE_Msk", "MR_SPI_CPHA"]
        );
    }
}
