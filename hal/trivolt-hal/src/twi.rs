//! Two-wire interface (TWI) abstractions
//!
//! Models a TWI master controller at the level of its control and status
//! registers: the caller issues one bus action at a time, polls for
//! completion, then inspects the status code. Protocol sequencing lives
//! above this trait, in `trivolt-core`.

/// Status codes reported by a TWI master controller
///
/// Values follow the AVR TWI status register with the prescaler bits
/// masked off. Both hardware and software controllers report these.
pub mod status {
    /// Mask that strips the prescaler bits from a raw status read
    pub const MASK: u8 = 0xF8;

    /// Illegal start or stop condition seen on the bus
    pub const BUS_ERROR: u8 = 0x00;
    /// Start condition transmitted
    pub const START: u8 = 0x08;
    /// Repeated start condition transmitted
    pub const REP_START: u8 = 0x10;
    /// SLA+W transmitted, ACK received
    pub const MT_SLA_ACK: u8 = 0x18;
    /// SLA+W transmitted, NACK received
    pub const MT_SLA_NACK: u8 = 0x20;
    /// Data byte transmitted, ACK received
    pub const MT_DATA_ACK: u8 = 0x28;
    /// Data byte transmitted, NACK received
    pub const MT_DATA_NACK: u8 = 0x30;
    /// Arbitration lost in SLA or data
    pub const ARB_LOST: u8 = 0x38;
    /// SLA+R transmitted, ACK received
    pub const MR_SLA_ACK: u8 = 0x40;
    /// SLA+R transmitted, NACK received
    pub const MR_SLA_NACK: u8 = 0x48;
    /// Data byte received, ACK returned
    pub const MR_DATA_ACK: u8 = 0x50;
    /// Data byte received, NACK returned
    pub const MR_DATA_NACK: u8 = 0x58;
    /// No relevant state information available
    pub const NO_INFO: u8 = 0xF8;
}

/// A single bus action handed to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Generate a start (or repeated start) condition
    Start,
    /// Shift out one byte (address+direction or data)
    Transmit(u8),
    /// Shift in one byte, answering with ACK (`true`) or NACK (`false`)
    Receive { ack: bool },
    /// Generate a stop condition and release the bus
    Stop,
}

/// TWI master controller
///
/// Every method maps to a register access on hardware. Implementations
/// must not block: [`issue`](Self::issue) starts an action and returns,
/// completion is observed by polling.
pub trait TwiController {
    /// Configure and enable the controller
    ///
    /// SDA and SCL become inputs with internal pull-ups disabled (the bus
    /// relies on external pull-ups), the bit rate is programmed from
    /// `timing`, and the unit is switched on. Calling it again reapplies
    /// the same configuration.
    fn enable(&mut self, timing: BitTiming);

    /// Start a bus action
    fn issue(&mut self, command: Command);

    /// Whether the last `Start`, `Transmit` or `Receive` has finished
    fn is_complete(&mut self) -> bool;

    /// Whether a stop condition is still being generated
    fn is_stopping(&mut self) -> bool;

    /// Raw status register, prescaler bits included
    fn status(&mut self) -> u8;

    /// Last byte shifted in by a `Receive`
    fn data(&mut self) -> u8;
}

/// Bit-rate settings derived from the CPU and bus clocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    /// Bit-rate register value
    pub divider: u8,
    /// Prescaler selection (0 = /1, 1 = /4, 2 = /16, 3 = /64)
    pub prescaler: u8,
    /// Target SCL frequency in Hz
    pub scl_hz: u32,
}

impl BitTiming {
    /// Compute the divider for `scl_hz` with the prescaler at /1
    ///
    /// `SCL = CPU / (16 + 2 * divider)`, so `divider = (CPU / SCL - 16) / 2`.
    /// Below 1.6 MHz the divider is pinned to zero.
    pub fn for_clock(cpu_hz: u32, scl_hz: u32) -> Self {
        let divider = if cpu_hz < 1_600_000 || scl_hz == 0 {
            0
        } else {
            let ratio = cpu_hz / scl_hz;
            (ratio.saturating_sub(16) / 2).min(u8::MAX as u32) as u8
        };

        Self {
            divider,
            prescaler: 0,
            scl_hz,
        }
    }

    /// SCL frequency actually produced by this divider
    pub fn effective_scl_hz(&self, cpu_hz: u32) -> u32 {
        let prescale = 1u32 << (2 * self.prescaler as u32);
        cpu_hz / (16 + 2 * self.divider as u32 * prescale)
    }
}

/// TWI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwiConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for TwiConfig {
    fn default() -> Self {
        Self {
            frequency: 100_000, // 100kHz standard mode
        }
    }
}

impl TwiConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };

    /// Bit timing for this frequency on a CPU running at `cpu_hz`
    pub fn timing(&self, cpu_hz: u32) -> BitTiming {
        BitTiming::for_clock(cpu_hz, self.frequency)
    }
}
