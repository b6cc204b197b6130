use log::{debug, trace, warn};

use crate::model::{Peripheral, Register};
use crate::util;

/// Every register, member and reserved word is one 32-bit word wide
pub const WORD: u32 = 4;

/// One entry of a peripheral's struct layout
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutDirective {
    Member(Member),
    Reserved(Reserved),
}

/// A register, or a folded family of indexed registers
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    /// Absolute address of the (first) register
    pub address: u32,
    pub name: String,
    /// Element count for arrays, `None` for a plain register
    pub count: Option<u32>,
}

/// Padding for an address range not covered by any register
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reserved {
    /// Byte offset from the peripheral base
    pub offset: u32,
    pub words: u32,
}

impl LayoutDirective {
    /// Number of 32-bit words this directive occupies
    pub fn words(&self) -> u32 {
        match self {
            Self::Member(m) => m.words(),
            Self::Reserved(r) => r.words,
        }
    }
}

impl Member {
    pub fn words(&self) -> u32 {
        self.count.unwrap_or(1)
    }
}

/// Family of `NAME[0]`, `NAME[1]`, ... registers still being extended
#[derive(Debug)]
struct LayoutRun {
    prefix: String,
    address: u32,
    count: u32,
}

impl From<LayoutRun> for Member {
    fn from(run: LayoutRun) -> Self {
        Self {
            address: run.address,
            name: run.prefix.to_uppercase(),
            count: Some(run.count),
        }
    }
}

struct Synthesizer<'a> {
    peripheral: &'a Peripheral,
    /// Next expected byte offset
    cursor: u32,
    run: Option<LayoutRun>,
    out: Vec<LayoutDirective>,
}

impl<'a> Synthesizer<'a> {
    fn new(peripheral: &'a Peripheral) -> Self {
        Self {
            peripheral,
            cursor: 0,
            run: None,
            out: Vec::new(),
        }
    }

    fn flush(&mut self) {
        if let Some(run) = self.run.take() {
            trace!("Closing {}[{}]", run.prefix, run.count);
            self.out.push(LayoutDirective::Member(run.into()));
        }
    }

    /// Moves the cursor to `offset`, padding any gap in between
    fn pad_to(&mut self, offset: u32) {
        if offset < self.cursor {
            warn!(
                "{}: register at offset 0x{:x} overlaps the layout ending at 0x{:x}",
                self.peripheral.name, offset, self.cursor
            );
        } else {
            let gap = offset - self.cursor;
            if gap % WORD != 0 {
                warn!(
                    "{}: register at offset 0x{:x} is not word aligned",
                    self.peripheral.name, offset
                );
            }
            let words = gap / WORD;
            if words != 0 {
                self.out.push(LayoutDirective::Reserved(Reserved {
                    offset: self.cursor,
                    words,
                }));
            }
        }
        self.cursor = offset;
    }

    fn push(&mut self, register: &Register) {
        let offset = register.address_offset;
        if offset != self.cursor {
            self.flush();
            self.pad_to(offset);
        }

        let address = self.peripheral.address_of(register);
        let key = util::family_key(&register.name);
        let continues = self
            .run
            .as_ref()
            .is_some_and(|run| key.is_element(&run.prefix, run.count));

        if continues {
            if let Some(run) = self.run.as_mut() {
                run.count += 1;
            }
        } else if key.is_first() {
            self.flush();
            self.run = Some(LayoutRun {
                prefix: key.prefix.into_owned(),
                address,
                count: 1,
            });
        } else {
            self.flush();
            self.out.push(LayoutDirective::Member(Member {
                address,
                name: register.name.to_uppercase(),
                count: None,
            }));
        }
        self.cursor = offset.wrapping_add(WORD);
    }

    fn finish(mut self) -> Vec<LayoutDirective> {
        self.flush();
        self.out
    }
}

/// Lays `p` out as a packed sequence of word-sized members.
///
/// Registers are visited in offset order. Gaps become [`Reserved`] blocks,
/// runs of consecutive `NAME[0]`, `NAME[1]`, ... registers fold into one
/// array [`Member`] and registers of an alternate group are left out.
pub fn render(p: &Peripheral) -> Vec<LayoutDirective> {
    debug!("Synthesizing layout of {}", p.name);
    let mut synthesizer = Synthesizer::new(p);
    for register in p.sorted_registers() {
        if register.alternate_group.is_some() {
            trace!("Skipping alternate register {}", register.name);
            continue;
        }
        trace!("Register: {}", register.name);
        synthesizer.push(register);
    }
    synthesizer.finish()
}

/// Name of the struct describing `p`
pub fn struct_name(p: &Peripheral) -> String {
    util::camel(&p.name)
}
