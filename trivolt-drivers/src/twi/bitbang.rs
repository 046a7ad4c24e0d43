//! Bit-banged two-wire controller
//!
//! Generates start, stop and byte transfers on two open-drain GPIO lines
//! and reports the outcome with the same status codes a hardware TWI unit
//! puts in its status register, so [`TwiController`] users cannot tell the
//! two apart. Every command runs to completion inside
//! [`issue`](TwiController::issue).
//!
//! Clock stretching is honoured: after releasing SCL the controller waits
//! for it to read high, for a bounded number of polls. A line held low for
//! longer is reported as a bus error and both lines are released.

use embedded_hal::delay::DelayNs;
use trivolt_hal::twi::{status, BitTiming, Command, TwiController};
use trivolt_hal::OpenDrainPin;

/// Default SCL polls before a stretched clock counts as stuck
pub const DEFAULT_STRETCH_POLLS: u32 = 1_000;

/// Wait between SCL polls while a device stretches the clock (ns)
const STRETCH_POLL_NS: u32 = 1_000;

/// Bus state as seen by the master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum LineState {
    Idle,
    /// Start sent, address byte next
    Started,
    /// Write transfer acknowledged
    Transmitting,
    /// Read transfer acknowledged
    Receiving,
    /// Address not acknowledged, waiting for stop or repeated start
    Rejected,
}

/// Why a transfer was abandoned mid-byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum LineFault {
    /// SDA read low while we released it, or the bus was busy at start
    ArbitrationLost,
    /// SCL stayed low past the stretch limit
    ClockStuck,
}

impl LineFault {
    fn status(self) -> u8 {
        match self {
            LineFault::ArbitrationLost => status::ARB_LOST,
            LineFault::ClockStuck => status::BUS_ERROR,
        }
    }
}

/// Software two-wire controller on a pair of open-drain pins
pub struct BitBangTwi<SDA, SCL, D> {
    sda: SDA,
    scl: SCL,
    delay: D,
    half_period_ns: u32,
    stretch_polls: u32,
    line: LineState,
    status: u8,
    data: u8,
}

impl<SDA, SCL, D> BitBangTwi<SDA, SCL, D>
where
    SDA: OpenDrainPin,
    SCL: OpenDrainPin,
    D: DelayNs,
{
    /// Controller on `sda` and `scl`, timed by `delay`
    ///
    /// The lines are left alone until [`enable`](TwiController::enable).
    pub fn new(sda: SDA, scl: SCL, delay: D) -> Self {
        Self {
            sda,
            scl,
            delay,
            half_period_ns: half_period_ns(100_000),
            stretch_polls: DEFAULT_STRETCH_POLLS,
            line: LineState::Idle,
            status: status::NO_INFO,
            data: 0,
        }
    }

    /// Give up on a stretched clock after `polls` SCL reads
    pub fn with_stretch_limit(mut self, polls: u32) -> Self {
        self.stretch_polls = polls;
        self
    }

    /// Half an SCL period (ns)
    pub fn half_period_ns(&self) -> u32 {
        self.half_period_ns
    }

    /// Give back the pins and the delay
    pub fn release(self) -> (SDA, SCL, D) {
        (self.sda, self.scl, self.delay)
    }

    fn half_delay(&mut self) {
        self.delay.delay_ns(self.half_period_ns);
    }

    /// Release SCL and wait until it actually reads high
    fn scl_high(&mut self) -> Result<(), LineFault> {
        self.scl.release();
        let mut polls = 0u32;
        while self.scl.is_low() {
            polls += 1;
            if polls > self.stretch_polls {
                return Err(LineFault::ClockStuck);
            }
            self.delay.delay_ns(STRETCH_POLL_NS);
        }
        Ok(())
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), LineFault> {
        self.sda.set_level(bit);
        self.half_delay();
        self.scl_high()?;
        if bit && self.sda.is_low() {
            return Err(LineFault::ArbitrationLost);
        }
        self.half_delay();
        self.scl.drive_low();
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, LineFault> {
        self.sda.release();
        self.half_delay();
        self.scl_high()?;
        let bit = self.sda.is_high();
        self.half_delay();
        self.scl.drive_low();
        Ok(bit)
    }

    fn start(&mut self) -> Result<u8, LineFault> {
        let repeated = self.line != LineState::Idle;

        if repeated {
            self.sda.release();
            self.half_delay();
            self.scl_high()?;
            if self.sda.is_low() {
                return Err(LineFault::ArbitrationLost);
            }
            self.half_delay();
        } else if self.sda.is_low() || self.scl.is_low() {
            // Someone else owns the bus
            return Err(LineFault::ArbitrationLost);
        }

        // SDA falls while SCL is high
        self.sda.drive_low();
        self.half_delay();
        self.scl.drive_low();
        self.line = LineState::Started;

        Ok(if repeated {
            status::REP_START
        } else {
            status::START
        })
    }

    fn transmit(&mut self, byte: u8) -> Result<u8, LineFault> {
        let (ack, nack, next) = match self.line {
            LineState::Started if byte & 0x01 == 0 => (
                status::MT_SLA_ACK,
                status::MT_SLA_NACK,
                LineState::Transmitting,
            ),
            LineState::Started => (
                status::MR_SLA_ACK,
                status::MR_SLA_NACK,
                LineState::Receiving,
            ),
            LineState::Transmitting => (
                status::MT_DATA_ACK,
                status::MT_DATA_NACK,
                LineState::Transmitting,
            ),
            _ => return Ok(status::BUS_ERROR),
        };

        for bit in (0..8).rev() {
            self.write_bit(byte & (1 << bit) != 0)?;
        }

        // Acknowledge is SDA pulled low by the device
        if !self.read_bit()? {
            self.line = next;
            Ok(ack)
        } else {
            if self.line == LineState::Started {
                self.line = LineState::Rejected;
            }
            Ok(nack)
        }
    }

    fn receive(&mut self, ack: bool) -> Result<u8, LineFault> {
        if self.line != LineState::Receiving {
            return Ok(status::BUS_ERROR);
        }

        let mut byte = 0u8;
        for _ in 0..8 {
            byte = (byte << 1) | self.read_bit()? as u8;
        }
        self.write_bit(!ack)?;
        self.data = byte;

        Ok(if ack {
            status::MR_DATA_ACK
        } else {
            status::MR_DATA_NACK
        })
    }

    fn stop(&mut self) {
        // Nothing of ours is on the bus, possibly another master's is
        if self.line == LineState::Idle {
            return;
        }

        self.sda.drive_low();
        self.half_delay();
        if self.scl_high().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("twi: SCL held low during stop");
        }
        self.half_delay();
        // SDA rises while SCL is high
        self.sda.release();
        self.half_delay();
        self.line = LineState::Idle;
    }

    /// Let go of both lines after a fault
    fn abandon(&mut self, fault: LineFault) -> u8 {
        #[cfg(feature = "defmt")]
        defmt::warn!("twi: transfer abandoned: {}", fault);
        self.sda.release();
        self.scl.release();
        self.line = LineState::Idle;
        fault.status()
    }
}

impl<SDA, SCL, D> TwiController for BitBangTwi<SDA, SCL, D>
where
    SDA: OpenDrainPin,
    SCL: OpenDrainPin,
    D: DelayNs,
{
    fn enable(&mut self, timing: BitTiming) {
        // Only the target frequency applies; there is no divider to program
        self.half_period_ns = half_period_ns(timing.scl_hz);
        self.sda.release();
        self.scl.release();
        self.line = LineState::Idle;
        self.status = status::NO_INFO;
    }

    fn issue(&mut self, command: Command) {
        let result = match command {
            Command::Start => self.start(),
            Command::Transmit(byte) => self.transmit(byte),
            Command::Receive { ack } => self.receive(ack),
            Command::Stop => {
                self.stop();
                Ok(status::NO_INFO)
            }
        };

        self.status = match result {
            Ok(status) => status,
            Err(fault) => self.abandon(fault),
        };
    }

    fn is_complete(&mut self) -> bool {
        true
    }

    fn is_stopping(&mut self) -> bool {
        false
    }

    fn status(&mut self) -> u8 {
        self.status
    }

    fn data(&mut self) -> u8 {
        self.data
    }
}

/// Half of one SCL period at `scl_hz`, 100 kHz when unset
fn half_period_ns(scl_hz: u32) -> u32 {
    let hz = if scl_hz == 0 { 100_000 } else { scl_hz };
    500_000_000 / hz
}
