//! Loading of CMSIS-SVD descriptions into the flat [`crate::model`] tree.
//!
//! Register, cluster, field and peripheral arrays are expanded here, so the
//! generators only ever see individual registers. Register array elements
//! keep their `[n]` index token, which is what lets the layout fold them back
//! into a single array member.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use log::{debug, trace, warn};
use svd_parser::svd;

use crate::config::{Config, SourceType};
use crate::model::{Device, EnumeratedValue, Field, Peripheral, Register};
use crate::util;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("peripheral {peripheral} is derived from unknown peripheral {base}")]
    MissingBase { peripheral: String, base: String },
    #[error("peripheral {peripheral} is derived from itself through {chain}")]
    DerivationCycle { peripheral: String, chain: String },
    #[error("base address 0x{address:x} of peripheral {peripheral} does not fit in 32 bits")]
    AddressOverflow { peripheral: String, address: u64 },
    #[error("field {register}.{field} has bit offset {offset} and width {width} out of range")]
    BitRange {
        register: String,
        field: String,
        offset: u32,
        width: u32,
    },
}

/// Parses `input` according to `config.source_type` and flattens it
pub fn load_from(input: &str, config: &Config) -> Result<Device> {
    use svd_parser::ValidateLevel;

    let validate_level = if config.strict {
        ValidateLevel::Strict
    } else {
        ValidateLevel::Weak
    };

    let device = match config.source_type {
        SourceType::Xml => {
            let mut parser_config = svd_parser::Config::default();
            parser_config.validate_level = validate_level;

            svd_parser::parse_with_config(input, &parser_config)
                .with_context(|| "Error parsing SVD XML file".to_string())?
        }
        #[cfg(feature = "yaml")]
        SourceType::Yaml => serde_yaml::from_str(input)
            .with_context(|| "Error parsing SVD YAML file".to_string())?,
        #[cfg(feature = "json")]
        SourceType::Json => serde_json::from_str(input)
            .with_context(|| "Error parsing SVD JSON file".to_string())?,
    };

    convert(&device, config)
}

/// Handles an out-of-range item: fatal in strict mode, skipped otherwise
fn reject(config: &Config, err: LoadError) -> Result<()> {
    if config.strict {
        Err(err.into())
    } else {
        warn!("{err}, skipping");
        Ok(())
    }
}

fn indices(dim: &svd::DimElement) -> Vec<String> {
    dim.dim_index
        .clone()
        .unwrap_or_else(|| (0..dim.dim).map(|i| i.to_string()).collect())
}

pub fn convert(device: &svd::Device, config: &Config) -> Result<Device> {
    let by_name: HashMap<&str, &svd::Peripheral> = device
        .peripherals
        .iter()
        .map(|p| (p.name.as_str(), p))
        .collect();

    let mut peripherals = Vec::new();
    for p in &device.peripherals {
        let Some(chain) = derivation_chain(p, &by_name, config)? else {
            continue;
        };

        let registers = match chain.iter().find_map(|p| p.registers.as_ref()) {
            Some(rcs) => {
                let mut registers = Vec::new();
                flatten(rcs, 0, "", &mut registers, config)?;
                registers
            }
            None => Vec::new(),
        };
        let description = chain.iter().find_map(|p| p.description.clone());
        let prepend_to_name = chain.iter().find_map(|p| p.prepend_to_name.clone());

        for (name, address) in instances(p) {
            let Ok(base_address) = u32::try_from(address) else {
                reject(
                    config,
                    LoadError::AddressOverflow {
                        peripheral: name,
                        address,
                    },
                )?;
                continue;
            };
            debug!(
                "Loaded {} with {} registers at 0x{:08x}",
                name,
                registers.len(),
                base_address
            );
            peripherals.push(Peripheral {
                name,
                base_address,
                description: description.clone(),
                prepend_to_name: prepend_to_name.clone(),
                registers: registers.clone(),
            });
        }
    }

    Ok(Device {
        name: device.name.clone(),
        description: Some(device.description.clone()).filter(|d| !d.trim().is_empty()),
        peripherals,
    })
}

/// `p` followed by every peripheral it is transitively derived from.
///
/// Returns `None` if the chain names an unknown peripheral or loops back on
/// itself and `config` is not strict.
fn derivation_chain<'a>(
    p: &'a svd::Peripheral,
    by_name: &HashMap<&str, &'a svd::Peripheral>,
    config: &Config,
) -> Result<Option<Vec<&'a svd::Peripheral>>> {
    let mut chain = vec![p];
    let mut visited = HashSet::from([p.name.as_str()]);
    let mut current = p;
    while let Some(base) = &current.derived_from {
        let Some(&next) = by_name.get(base.as_str()) else {
            reject(
                config,
                LoadError::MissingBase {
                    peripheral: current.name.clone(),
                    base: base.clone(),
                },
            )?;
            return Ok(None);
        };
        if !visited.insert(next.name.as_str()) {
            let names: Vec<_> = chain.iter().map(|p| p.name.as_str()).collect();
            reject(
                config,
                LoadError::DerivationCycle {
                    peripheral: p.name.clone(),
                    chain: format!("{} -> {}", names.join(" -> "), next.name),
                },
            )?;
            return Ok(None);
        }
        trace!("{} is derived from {}", current.name, next.name);
        chain.push(next);
        current = next;
    }
    Ok(Some(chain))
}

/// Name and base address of every instance of `p`
fn instances(p: &svd::Peripheral) -> Vec<(String, u64)> {
    match p {
        svd::Peripheral::Single(info) => vec![(info.name.clone(), info.base_address)],
        svd::Peripheral::Array(info, dim) => indices(dim)
            .iter()
            .zip(0u64..)
            .map(|(idx, i)| {
                (
                    util::replace_suffix(&info.name, idx),
                    info.base_address + i * u64::from(dim.dim_increment),
                )
            })
            .collect(),
    }
}

/// Flattens registers and clusters into `out`, with offsets relative to the
/// peripheral base and cluster names prepended to their children.
fn flatten(
    rcs: &[svd::RegisterCluster],
    offset: u32,
    prefix: &str,
    out: &mut Vec<Register>,
    config: &Config,
) -> Result<()> {
    for rc in rcs {
        match rc {
            svd::RegisterCluster::Register(r) => {
                if let Some(size) = r.properties.size {
                    if size != 32 {
                        warn!("Register {} is {} bits wide, laid out as 32", r.name, size);
                    }
                }
                let fields = convert_fields(r.fields.as_deref().unwrap_or(&[]), &r.name, config)?;
                let elements = match r {
                    svd::Register::Single(info) => vec![(info.name.clone(), info.address_offset)],
                    svd::Register::Array(info, dim) => indices(dim)
                        .iter()
                        .zip(0u32..)
                        .map(|(idx, i)| {
                            (
                                util::replace_index(&info.name, idx),
                                info.address_offset
                                    .wrapping_add(i.wrapping_mul(dim.dim_increment)),
                            )
                        })
                        .collect(),
                };
                for (name, address_offset) in elements {
                    trace!("Register: {prefix}{name}");
                    out.push(Register {
                        name: format!("{prefix}{name}"),
                        address_offset: offset.wrapping_add(address_offset),
                        description: r.description.clone(),
                        alternate_group: r.alternate_group.clone(),
                        fields: fields.clone(),
                    });
                }
            }
            svd::RegisterCluster::Cluster(c) => {
                let elements = match c {
                    svd::Cluster::Single(info) => vec![(info.name.clone(), info.address_offset)],
                    svd::Cluster::Array(info, dim) => indices(dim)
                        .iter()
                        .zip(0u32..)
                        .map(|(idx, i)| {
                            (
                                util::replace_suffix(&info.name, idx),
                                info.address_offset
                                    .wrapping_add(i.wrapping_mul(dim.dim_increment)),
                            )
                        })
                        .collect(),
                };
                for (name, address_offset) in elements {
                    trace!("Cluster: {prefix}{name}");
                    flatten(
                        &c.children,
                        offset.wrapping_add(address_offset),
                        &format!("{prefix}{name}_"),
                        out,
                        config,
                    )?;
                }
            }
        }
    }
    Ok(())
}

fn convert_fields(fields: &[svd::Field], register: &str, config: &Config) -> Result<Vec<Field>> {
    let mut out = Vec::new();
    for f in fields {
        let elements = match f {
            svd::Field::Single(info) => vec![(info.name.clone(), info.bit_range.offset)],
            svd::Field::Array(info, dim) => indices(dim)
                .iter()
                .zip(0u32..)
                .map(|(idx, i)| {
                    (
                        util::replace_suffix(&info.name, idx),
                        info.bit_range.offset + i * dim.dim_increment,
                    )
                })
                .collect(),
        };
        let values = convert_values(f);
        for (name, offset) in elements {
            let width = f.bit_range.width;
            let (Ok(bit_offset), Ok(bit_width)) = (u8::try_from(offset), u8::try_from(width))
            else {
                reject(
                    config,
                    LoadError::BitRange {
                        register: register.to_string(),
                        field: name,
                        offset,
                        width,
                    },
                )?;
                continue;
            };
            out.push(Field {
                name,
                bit_offset,
                bit_width,
                description: f.description.clone(),
                enumerated_values: values.clone(),
            });
        }
    }
    Ok(out)
}

/// Merges all `enumeratedValues` blocks of `f`, first name wins
fn convert_values(f: &svd::FieldInfo) -> Vec<EnumeratedValue> {
    let mut out: Vec<EnumeratedValue> = Vec::new();
    for ev in f.enumerated_values.iter().flat_map(|evs| evs.values.iter()) {
        let Some(value) = ev.value else {
            trace!("{}.{} has no value, skipping", f.name, ev.name);
            continue;
        };
        if out.iter().any(|v| v.name == ev.name) {
            continue;
        }
        out.push(EnumeratedValue {
            name: ev.name.clone(),
            value,
            description: ev.description.clone(),
        });
    }
    out
}
