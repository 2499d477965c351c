//! Bus transactions and their bit-level encoding

use serde::{Deserialize, Serialize};

use super::Lfsr;
use crate::error::{Result, RffeError};
use crate::types::{CommandType, byte_count};

/// Odd-parity bit for every byte value, built by nibble folding rather than
/// bit counting.
const PARITY_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    let mut value = 0;
    while value < 256 {
        let folded = (value ^ (value >> 4)) & 0xF;
        table[value] = (0x6996u16 >> folded) & 1 == 0;
        value += 1;
    }
    table
};

fn byte_parity(byte: u8) -> bool {
    PARITY_TABLE[byte as usize]
}

/// Odd-parity bit over the 4-bit address and 8-bit command together.
fn header_parity(slave_address: u8, command: u8) -> bool {
    !(byte_parity(slave_address & 0xF) ^ byte_parity(command))
}

/// One bus transaction as the master would drive it.
///
/// `bytes` holds every address and data byte after the header in wire order.
/// Only Interrupt commands carry `interrupts`, a mask with bit `n` set when
/// slot `n` is signalled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub slave_address: u8,
    pub command: u8,
    pub bytes: Vec<u8>,
    pub interrupts: Option<u16>,
}

impl Transaction {
    /// Build a non-interrupt transaction, checking the payload length.
    pub fn new(slave_address: u8, command: u8, bytes: Vec<u8>) -> Result<Self> {
        let transaction = Self { slave_address, command, bytes, interrupts: None };
        transaction.validate()?;
        Ok(transaction)
    }

    /// Interrupt command; `None` sends an ISI without slots.
    pub fn interrupt(slave_address: u8, interrupts: Option<u16>) -> Result<Self> {
        let transaction = Self { slave_address, command: 0x1F, bytes: Vec::new(), interrupts };
        transaction.validate()?;
        Ok(transaction)
    }

    /// Random payload drawn from `lfsr` for any command byte.
    pub fn random(slave_address: u8, command: u8, lfsr: &mut Lfsr) -> Self {
        let command_type = CommandType::classify(command);
        let length = Self::expected_payload_len(command);
        let bytes = (0..length)
            .map(|_| match command_type {
                // only the acknowledge bit and the two defined bits may be set
                CommandType::MasterHandoff => (lfsr.next_byte() & 0x18) | 0x80,
                _ => lfsr.next_byte(),
            })
            .collect();
        let interrupts = (command_type == CommandType::Interrupt).then(|| {
            (0..16).rev().fold(0u16, |mask, slot| {
                if lfsr.next_byte() & 0x2 != 0 { mask | (1 << slot) } else { mask }
            })
        });
        Self { slave_address: slave_address & 0xF, command, bytes, interrupts }
    }

    pub fn command_type(&self) -> CommandType {
        CommandType::classify(self.command)
    }

    /// Number of bytes a command carries after its header.
    pub fn expected_payload_len(command: u8) -> usize {
        let data_bytes = usize::from(byte_count(command)) + 1;
        match CommandType::classify(command) {
            CommandType::ExtWrite
            | CommandType::ExtRead
            | CommandType::MasterRead
            | CommandType::MasterWrite => 1 + data_bytes,
            CommandType::ExtLongWrite | CommandType::ExtLongRead => 2 + data_bytes,
            CommandType::MasterHandoff => data_bytes,
            CommandType::NormalWrite | CommandType::NormalRead => 1,
            CommandType::Reserved | CommandType::Interrupt | CommandType::Write0 => 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.slave_address > 0xF {
            return Err(RffeError::invalid_transaction(
                self.command,
                format!("slave address {:#x} does not fit in 4 bits", self.slave_address),
            ));
        }
        let expected = Self::expected_payload_len(self.command);
        if self.bytes.len() != expected {
            return Err(RffeError::invalid_transaction(
                self.command,
                format!("{} carries {} payload bytes, got {}", self.command_type(), expected, self.bytes.len()),
            ));
        }
        if self.interrupts.is_some() && self.command_type() != CommandType::Interrupt {
            return Err(RffeError::invalid_transaction(
                self.command,
                "only Interrupt commands carry interrupt slots",
            ));
        }
        Ok(())
    }

    /// Bits clocked after the start condition, including parity and bus parks.
    pub fn wire_bits(&self) -> Vec<bool> {
        let mut bits = WireBits::default();
        bits.push_value(u64::from(self.slave_address & 0xF), 4);
        bits.push_value(u64::from(self.command), 8);
        bits.push(header_parity(self.slave_address, self.command));

        let mut payload = self.bytes.iter().copied();
        let mut bytes = |bits: &mut WireBits, count: usize| {
            for byte in payload.by_ref().take(count) {
                bits.push_byte(byte);
            }
        };

        match self.command_type() {
            CommandType::ExtWrite
            | CommandType::ExtLongWrite
            | CommandType::MasterWrite
            | CommandType::NormalWrite => bytes(&mut bits, usize::MAX),
            CommandType::ExtRead | CommandType::MasterRead => {
                bytes(&mut bits, 1);
                bits.bus_park();
                bytes(&mut bits, usize::MAX);
            }
            CommandType::ExtLongRead => {
                bytes(&mut bits, 2);
                bits.bus_park();
                bytes(&mut bits, usize::MAX);
            }
            CommandType::MasterHandoff | CommandType::NormalRead => {
                bits.bus_park();
                bytes(&mut bits, usize::MAX);
            }
            CommandType::Interrupt => {
                bits.bus_park();
                match self.interrupts {
                    Some(mask) => {
                        bits.push_value(0b11, 2);
                        bits.bus_park();
                        for slot in (0..16).rev() {
                            bits.push(mask & (1 << slot) != 0);
                            bits.bus_park();
                        }
                    }
                    None => {
                        bits.push_value(0b10, 2);
                        bits.bus_park();
                    }
                }
                return bits.0;
            }
            CommandType::Reserved | CommandType::Write0 => {}
        }

        bits.bus_park();
        bits.0
    }
}

#[derive(Default)]
struct WireBits(Vec<bool>);

impl WireBits {
    fn push(&mut self, bit: bool) {
        self.0.push(bit);
    }

    fn push_value(&mut self, value: u64, width: u32) {
        for shift in (0..width).rev() {
            self.push((value >> shift) & 1 != 0);
        }
    }

    fn push_byte(&mut self, byte: u8) {
        self.push_value(u64::from(byte), 8);
        self.push(byte_parity(byte));
    }

    fn bus_park(&mut self) {
        self.push(false);
    }
}
