//! C++ header rendering of the generated directives.
//!
//! The output targets the companion `hardware_registers` library:
//! registers are `hardware_register<address>` members, gaps are
//! `reserved<offset, words>` members and field constants are built with
//! `field_mask_literal` / `field_value_literal`.

use std::fmt::Write;

use anyhow::Result;

use crate::config::Config;
use crate::util::{self, hex};

use super::device::{DeviceOutput, PeripheralOutput};
use super::peripheral::LayoutDirective;
use super::register::ConstantDirective;

const INDENT: &str = "   ";

fn separator() -> String {
    format!("// {}", "=".repeat(77))
}

pub fn render(d: &DeviceOutput, config: &Config) -> Result<String> {
    let ns = config.namespace();
    let mut out = String::new();

    writeln!(out, "#include \"{}\"", config.include())?;
    writeln!(out, "namespace {ns} = hardware_registers;")?;
    writeln!(out)?;

    writeln!(out, "{}", separator())?;
    writeln!(out, "//")?;
    writeln!(out, "// {}", d.name)?;
    writeln!(out, "//")?;
    writeln!(out, "// {}", util::description_or(&d.description, &d.name))?;
    writeln!(out, "//")?;
    writeln!(out, "{}", separator())?;
    writeln!(out)?;

    for p in &d.peripherals {
        render_peripheral(&mut out, p, ns)?;
    }

    Ok(out)
}

fn render_peripheral(out: &mut String, p: &PeripheralOutput, ns: &str) -> Result<()> {
    writeln!(out, "{}", separator())?;
    writeln!(out, "//")?;
    writeln!(out, "// {}", p.name)?;
    writeln!(out, "// base address = {}", hex(p.base_address))?;
    writeln!(out, "// {}", util::description_or(&p.description, &p.name))?;
    writeln!(out, "//")?;
    writeln!(out, "{}", separator())?;
    writeln!(out)?;

    writeln!(out, "struct {} {{", p.struct_name)?;
    for directive in &p.layout {
        match directive {
            LayoutDirective::Member(m) => {
                let ty = format!("{ns}::hardware_register<{}>", hex(m.address));
                match m.count {
                    Some(count) => writeln!(out, "{INDENT}{ty} {}[{count}];", m.name)?,
                    None => writeln!(out, "{INDENT}{ty} {};", m.name)?,
                }
            }
            LayoutDirective::Reserved(r) => writeln!(
                out,
                "{INDENT}{ns}::reserved< 0x{:X}, {} > _reserved_at_0x{:X};",
                r.offset, r.words, r.offset
            )?,
        }
    }
    writeln!(out, "}};")?;
    writeln!(out)?;

    writeln!(
        out,
        "#define {} ( ( {} * ) {} )",
        p.name.to_uppercase(),
        p.struct_name,
        hex(p.base_address)
    )?;
    writeln!(out)?;

    for block in &p.constants {
        writeln!(out, "// {}", block.register)?;
        for constant in &block.constants {
            render_constant(out, constant, ns)?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn render_constant(out: &mut String, constant: &ConstantDirective, ns: &str) -> Result<()> {
    match constant {
        ConstantDirective::FieldMask {
            name,
            description,
            address,
            bit_offset,
            bit_width,
        } => {
            writeln!(out, "{INDENT}// {}", util::description_or(description, name))?;
            writeln!(
                out,
                "{INDENT}constexpr auto {name} = {ns}::field_mask_literal< {}, {bit_offset}, {bit_width} >();",
                hex(*address)
            )?;
        }
        ConstantDirective::FieldValue {
            name,
            description,
            address,
            bit_offset,
            bit_width,
            value,
        } => {
            writeln!(
                out,
                "{INDENT}{INDENT}// {}",
                util::description_or(description, name)
            )?;
            writeln!(
                out,
                "{INDENT}{INDENT}constexpr auto {name} = {ns}::field_value_literal< {}, {bit_offset}, {bit_width} >( {value} );",
                hex(*address)
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::device;
    use crate::model::{Device, EnumeratedValue, Field, Peripheral, Register};

    fn timer_device() -> Device {
        Device::new("ATSAM3X8E").with_peripheral(
            Peripheral::new("TC", 0x4008_0000)
                .with_description("Timer Counter")
                .with_register(
                    Register::new("CCR", 0).with_field(
                        Field::new("CLKEN", 0, 1).with_description("Counter Clock Enable"),
                    ),
                )
                .with_register(
                    Register::new("CMR", 4).with_field(
                        Field::new("TCCLKS", 0, 3)
                            .with_description("Clock Selection")
                            .with_value(EnumeratedValue::new("TIMER_CLOCK2", 1)),
                    ),
                )
                .with_register(Register::new("RA[0]", 0x14))
                .with_register(Register::new("RA[1]", 0x18)),
        )
    }

    fn header(config: &Config) -> String {
        render(&device::render(&timer_device(), config), config).unwrap()
    }

    #[test]
    fn struct_layout() {
        let header = header(&Config::default());
        let expected = "\
struct Tc {
   hr::hardware_register<0x40080000> CCR;
   hr::hardware_register<0x40080004> CMR;
   hr::reserved< 0x8, 3 > _reserved_at_0x8;
   hr::hardware_register<0x40080014> RA[2];
};

#define TC ( ( Tc * ) 0x40080000 )
";
        assert!(header.contains(expected), "{header}");
    }

    #[test]
    fn constants() {
        let header = header(&Config::default());
        let expected = "\
// CMR
   // Clock Selection
   constexpr auto CMR_TCCLKS_Msk = hr::field_mask_literal< 0x40080004, 0, 3 >();
      // CMR_TCCLKS_TIMER_CLOCK2
      constexpr auto CMR_TCCLKS_TIMER_CLOCK2 = hr::field_value_literal< 0x40080004, 0, 3 >( 1 );
";
        assert!(header.contains(expected), "{header}");
        assert!(header.contains("constexpr auto CCR_CLKEN = hr::field_mask_literal< 0x40080000, 0, 1 >();"));
    }

    #[test]
    fn prologue_and_banner() {
        let header = header(&Config::default());
        assert!(header.starts_with(
            "#include \"hardware_registers.hpp\"\nnamespace hr = hardware_registers;\n\n"
        ));
        assert!(header.contains("// TC\n// base address = 0x40080000\n// Timer Counter\n"));
        assert!(header.contains(&format!("// {}\n", "=".repeat(77))));
    }

    #[test]
    fn namespace_and_include_are_configurable() {
        let config = Config {
            namespace: Some("regs".to_string()),
            include: Some("hwlib/registers.hpp".to_string()),
            ..Default::default()
        };
        let header = header(&config);
        assert!(header.starts_with("#include \"hwlib/registers.hpp\"\nnamespace regs = hardware_registers;"));
        assert!(header.contains("   regs::hardware_register<0x40080000> CCR;"));
        assert!(!header.contains("hr::"));
    }
}
