//! C++ register layout generator from [CMSIS-SVD] files
//!
//! [CMSIS-SVD]: http://www.keil.com/pack/doc/CMSIS/SVD/html/index.html
//!
//! A SVD file is an XML file that describes the hardware features of a
//! microcontroller. In particular, it lists all the peripherals available to
//! the device, where the registers associated to each peripheral are located
//! in memory and what the function of each register and bit field is.
//!
//! `svd2hwreg` is a command line tool that transforms SVD files into a C++
//! header built on the `hardware_registers` library, where every register is
//! a type that carries its own address. Mixing up masks and values of
//! different registers then becomes a compile time error.
//!
//! # Usage
//!
//! ```text
//! $ svd2hwreg -i ATSAM3X8E.svd -o include/
//! ```
//!
//! The output lands in `header.hpp` (see `--output`). Settings can also be
//! read from a `svd2hwreg.toml` file in the working directory, or the file
//! given by `--config`.
//!
//! # Peripheral layout
//!
//! Each peripheral becomes a `struct` whose members are laid out at a 4 byte
//! stride, one member per register, starting at the peripheral base:
//!
//! ```text
//! struct Pioa {
//!    hr::hardware_register<0x400e0e00> PER;
//!    hr::hardware_register<0x400e0e04> PDR;
//!    hr::reserved< 0x8, 2 > _reserved_at_0x8;
//!    hr::hardware_register<0x400e0e10> OER;
//! };
//!
//! #define PIOA ( ( Pioa * ) 0x400e0e00 )
//! ```
//!
//! - Address ranges that no register covers are padded with a `reserved`
//!   member sized in words.
//! - Consecutive registers `NAME[0]`, `NAME[1]`, ... fold into one array
//!   member `NAME[n]`. The run ends at the first gap or unrelated register.
//! - Registers belonging to an alternate group share the address of another
//!   register and are left out of the layout.
//!
//! # Field constants
//!
//! Every field also gets a constant usable without the struct, by absolute
//! address. Multi-bit masks carry a `_Msk` suffix, enumerated values are
//! named after their field:
//!
//! ```text
//! // CMR
//!    // Clock Selection
//!    constexpr auto CMR_TCCLKS_Msk = hr::field_mask_literal< 0x40080004, 0, 3 >();
//!       // Clock selected: internal MCK/8 clock signal
//!       constexpr auto CMR_TCCLKS_TIMER_CLOCK2 = hr::field_value_literal< 0x40080004, 0, 3 >( 1 );
//! ```
//!
//! Peripherals whose name marks them as one numbered instance of a family
//! (`TC0`, `TC1`, ...) only get the struct, since constants of different
//! instances would collide. Which names count as instances is set by
//! [`config::InstanceRule`]. Fields of registers past the first element of
//! a family are only reachable through the struct as well.
//!
//! # Library use
//!
//! [`generate()`] runs the whole pipeline and [`render`] starts from an
//! already loaded device. The pieces are available on their own as well:
//! [`load_from`] builds the [`model`], [`generate::device::render`] produces
//! the layout and constant directives and [`generate::header::render`] turns
//! them into text.

pub mod config;
pub mod generate;
pub mod load;
pub mod model;
pub mod util;

pub use config::Config;
pub use load::load_from;

use anyhow::{Context, Result};

use crate::generate::device::DeviceOutput;

#[non_exhaustive]
pub struct Generation {
    pub header: String,
    pub directives: DeviceOutput,
}

#[derive(Clone, Copy, Debug, thiserror::Error)]
pub enum SvdError {
    #[error("Cannot load SVD device")]
    Load,
    #[error("Cannot render SVD device")]
    Render,
}

/// Generates a C++ header from the given SVD `input`
pub fn generate(input: &str, config: &Config) -> Result<Generation> {
    let device = load_from(input, config).context(SvdError::Load)?;
    render(&device, config)
}

/// Generates a C++ header from an already loaded `device`
pub fn render(device: &model::Device, config: &Config) -> Result<Generation> {
    let directives = generate::device::render(device, config);
    let header = generate::header::render(&directives, config).context(SvdError::Render)?;

    Ok(Generation { header, directives })
}
