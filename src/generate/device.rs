use log::{debug, info};

use crate::config::Config;
use crate::generate::{peripheral, register};
use crate::model::{Device, Peripheral};

use super::peripheral::LayoutDirective;
use super::register::RegisterConstants;

/// Directive sequences of a whole device, in peripheral declaration order
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceOutput {
    pub name: String,
    pub description: Option<String>,
    pub peripherals: Vec<PeripheralOutput>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeripheralOutput {
    pub name: String,
    pub struct_name: String,
    pub base_address: u32,
    pub description: Option<String>,
    pub layout: Vec<LayoutDirective>,
    pub constants: Vec<RegisterConstants>,
}

/// Whole device generation
pub fn render(d: &Device, config: &Config) -> DeviceOutput {
    info!("Generating layouts for {} peripherals", d.peripherals.len());
    DeviceOutput {
        name: d.name.clone(),
        description: d.description.clone(),
        peripherals: d
            .peripherals
            .iter()
            .map(|p| render_peripheral(p, config))
            .collect(),
    }
}

pub fn render_peripheral(p: &Peripheral, config: &Config) -> PeripheralOutput {
    debug!("Peripheral: {} at 0x{:08x}", p.name, p.base_address);
    PeripheralOutput {
        name: p.name.clone(),
        struct_name: peripheral::struct_name(p),
        base_address: p.base_address,
        description: p.description.clone(),
        layout: peripheral::render(p),
        constants: register::render(p, config.instance_rule),
    }
}
