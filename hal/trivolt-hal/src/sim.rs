//! Scripted TWI controller for host-side tests
//!
//! [`SimController`] behaves like a hardware TWI unit with a few devices
//! attached. Every bus action is recorded as a [`BusEvent`] so tests can
//! assert on the exact signal sequence. Devices can be made busy for a
//! number of address attempts, and the controller can be made to stall
//! to exercise timeouts.

use heapless::Vec;

use crate::twi::{status, BitTiming, Command, TwiController};

/// Maximum number of recorded bus events
pub const MAX_EVENTS: usize = 512;

/// Maximum number of simulated devices
pub const MAX_DEVICES: usize = 4;

/// Maximum number of bytes a device keeps from writes
pub const MAX_RECEIVED: usize = 64;

/// Something the simulated controller put on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// Start condition (`repeated` when issued inside a transaction)
    Start { repeated: bool },
    /// Address+direction byte
    Address(u8),
    /// Data byte written by the master
    Write(u8),
    /// Data byte read by the master
    Read { value: u8, ack: bool },
    /// Stop condition
    Stop,
}

/// A device attached to the simulated bus
#[derive(Debug, Clone)]
pub struct SimDevice {
    address: u8,
    busy_for: u16,
    accept_bytes: Option<usize>,
    read_data: Vec<u8, MAX_RECEIVED>,
    read_pos: usize,
    received: Vec<u8, MAX_RECEIVED>,
}

impl SimDevice {
    /// Device answering at the 7-bit `address`
    pub fn new(address: u8) -> Self {
        Self {
            address,
            busy_for: 0,
            accept_bytes: None,
            read_data: Vec::new(),
            read_pos: 0,
            received: Vec::new(),
        }
    }

    /// NACK the next `attempts` address phases
    pub fn busy_for(mut self, attempts: u16) -> Self {
        self.busy_for = attempts;
        self
    }

    /// ACK only the first `count` data bytes of each transaction
    pub fn accept_bytes(mut self, count: usize) -> Self {
        self.accept_bytes = Some(count);
        self
    }

    /// Bytes returned by reads, repeated cyclically
    pub fn with_read_data(mut self, data: &[u8]) -> Self {
        self.read_data.clear();
        let _ = self.read_data.extend_from_slice(data);
        self
    }

    /// 7-bit address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// All data bytes written to this device
    pub fn received(&self) -> &[u8] {
        &self.received
    }

    fn next_read(&mut self) -> u8 {
        if self.read_data.is_empty() {
            return 0xFF;
        }
        let value = self.read_data[self.read_pos % self.read_data.len()];
        self.read_pos += 1;
        value
    }
}

/// Where the simulated bus is in the current transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    /// Bus released
    Idle,
    /// Start sent, waiting for the address byte
    Started,
    /// A device acknowledged its address
    Addressed { device: usize, read: bool, written: usize },
    /// Address was not acknowledged; bus held until stop
    Rejected,
}

/// Simulated TWI master controller
#[derive(Debug)]
pub struct SimController {
    devices: Vec<SimDevice, MAX_DEVICES>,
    events: Vec<BusEvent, MAX_EVENTS>,
    timing: Option<BitTiming>,
    enable_count: u32,
    line: Line,
    status: u8,
    data: u8,
    latency: u32,
    pending: u32,
    stop_latency: u32,
    stopping: u32,
    stalled: bool,
    start_faults: u16,
    polls: u32,
}

impl Default for SimController {
    fn default() -> Self {
        Self::new()
    }
}

impl SimController {
    /// Controller with an empty bus
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            events: Vec::new(),
            timing: None,
            enable_count: 0,
            line: Line::Idle,
            status: status::NO_INFO,
            data: 0,
            latency: 0,
            pending: 0,
            stop_latency: 0,
            stopping: 0,
            stalled: false,
            start_faults: 0,
            polls: 0,
        }
    }

    /// Attach a device
    pub fn with_device(mut self, device: SimDevice) -> Self {
        let _ = self.devices.push(device);
        self
    }

    /// Report completion only after `polls` unsuccessful status polls
    pub fn with_latency(mut self, polls: u32) -> Self {
        self.latency = polls;
        self
    }

    /// Keep the stop flag set for `polls` polls after a stop
    pub fn with_stop_latency(mut self, polls: u32) -> Self {
        self.stop_latency = polls;
        self
    }

    /// Report `ARB_LOST` for the next `count` start conditions
    pub fn with_start_faults(mut self, count: u16) -> Self {
        self.start_faults = count;
        self
    }

    /// Never complete any further action
    pub fn stall(&mut self) {
        self.stalled = true;
    }

    /// Timing last applied through `enable`
    pub fn timing(&self) -> Option<BitTiming> {
        self.timing
    }

    /// Number of `enable` calls
    pub fn enable_count(&self) -> u32 {
        self.enable_count
    }

    /// Recorded bus events, oldest first
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Number of recorded events matching `pred`
    pub fn count(&self, pred: impl Fn(&BusEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    /// Attached device by 7-bit address
    pub fn device(&self, address: u8) -> Option<&SimDevice> {
        self.devices.iter().find(|d| d.address == address)
    }

    /// Whether the simulated bus is between start and stop
    pub fn is_bus_held(&self) -> bool {
        self.line != Line::Idle
    }

    /// Total completion and stop-flag polls seen
    pub fn polls(&self) -> u32 {
        self.polls
    }

    fn record(&mut self, event: BusEvent) {
        let _ = self.events.push(event);
    }

    fn start(&mut self) {
        let repeated = self.line != Line::Idle;
        self.record(BusEvent::Start { repeated });

        if self.start_faults > 0 {
            self.start_faults -= 1;
            self.status = status::ARB_LOST;
            self.line = Line::Idle;
            return;
        }

        self.status = if repeated {
            status::REP_START
        } else {
            status::START
        };
        self.line = Line::Started;
    }

    fn transmit(&mut self, byte: u8) {
        match self.line {
            Line::Started => {
                self.record(BusEvent::Address(byte));
                let read = byte & 0x01 != 0;
                let target = byte >> 1;
                let found = self.devices.iter().position(|d| d.address == target);

                let acked = match found {
                    Some(index) => {
                        let device = &mut self.devices[index];
                        if device.busy_for > 0 {
                            device.busy_for -= 1;
                            false
                        } else {
                            true
                        }
                    }
                    None => false,
                };

                match (found, acked) {
                    (Some(device), true) => {
                        self.line = Line::Addressed {
                            device,
                            read,
                            written: 0,
                        };
                        self.status = if read {
                            status::MR_SLA_ACK
                        } else {
                            status::MT_SLA_ACK
                        };
                    }
                    _ => {
                        self.line = Line::Rejected;
                        self.status = if read {
                            status::MR_SLA_NACK
                        } else {
                            status::MT_SLA_NACK
                        };
                    }
                }
            }
            Line::Addressed {
                device,
                read: false,
                written,
            } => {
                self.record(BusEvent::Write(byte));
                let target = &mut self.devices[device];
                let accepted = target.accept_bytes.map_or(true, |limit| written < limit);
                if accepted {
                    let _ = target.received.push(byte);
                    self.status = status::MT_DATA_ACK;
                } else {
                    self.status = status::MT_DATA_NACK;
                }
                self.line = Line::Addressed {
                    device,
                    read: false,
                    written: written + 1,
                };
            }
            _ => {
                self.record(BusEvent::Write(byte));
                self.status = status::BUS_ERROR;
            }
        }
    }

    fn receive(&mut self, ack: bool) {
        match self.line {
            Line::Addressed {
                device, read: true, ..
            } => {
                let value = self.devices[device].next_read();
                self.data = value;
                self.record(BusEvent::Read { value, ack });
                self.status = if ack {
                    status::MR_DATA_ACK
                } else {
                    status::MR_DATA_NACK
                };
            }
            _ => {
                self.data = 0xFF;
                self.record(BusEvent::Read { value: 0xFF, ack });
                self.status = status::BUS_ERROR;
            }
        }
    }
}

impl TwiController for SimController {
    fn enable(&mut self, timing: BitTiming) {
        self.timing = Some(timing);
        self.enable_count += 1;
    }

    fn issue(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Transmit(byte) => self.transmit(byte),
            Command::Receive { ack } => self.receive(ack),
            Command::Stop => {
                self.record(BusEvent::Stop);
                self.line = Line::Idle;
                self.stopping = self.stop_latency;
                self.status = status::NO_INFO;
                return;
            }
        }
        self.pending = self.latency;
    }

    fn is_complete(&mut self) -> bool {
        self.polls += 1;
        if self.stalled {
            return false;
        }
        if self.pending == 0 {
            true
        } else {
            self.pending -= 1;
            false
        }
    }

    fn is_stopping(&mut self) -> bool {
        self.polls += 1;
        if self.stalled {
            return true;
        }
        if self.stopping == 0 {
            false
        } else {
            self.stopping -= 1;
            true
        }
    }

    fn status(&mut self) -> u8 {
        self.status
    }

    fn data(&mut self) -> u8 {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_transaction_events() {
        let mut sim = SimController::new().with_device(SimDevice::new(0x3E));

        sim.issue(Command::Start);
        assert_eq!(sim.status(), status::START);
        sim.issue(Command::Transmit(0x3E << 1));
        assert_eq!(sim.status(), status::MT_SLA_ACK);
        sim.issue(Command::Transmit(0x80));
        assert_eq!(sim.status(), status::MT_DATA_ACK);
        sim.issue(Command::Stop);

        assert_eq!(
            sim.events(),
            &[
                BusEvent::Start { repeated: false },
                BusEvent::Address(0x7C),
                BusEvent::Write(0x80),
                BusEvent::Stop,
            ]
        );
        assert_eq!(sim.device(0x3E).unwrap().received(), &[0x80]);
        assert!(!sim.is_bus_held());
    }

    #[test]
    fn test_busy_device_nacks_then_acks() {
        let mut sim = SimController::new().with_device(SimDevice::new(0x50).busy_for(1));

        sim.issue(Command::Start);
        sim.issue(Command::Transmit(0xA0));
        assert_eq!(sim.status(), status::MT_SLA_NACK);
        sim.issue(Command::Stop);

        sim.issue(Command::Start);
        sim.issue(Command::Transmit(0xA0));
        assert_eq!(sim.status(), status::MT_SLA_ACK);
    }

    #[test]
    fn test_absent_device_read_nack() {
        let mut sim = SimController::new();
        sim.issue(Command::Start);
        sim.issue(Command::Transmit(0xA1));
        assert_eq!(sim.status(), status::MR_SLA_NACK);
    }

    #[test]
    fn test_repeated_start_status() {
        let mut sim = SimController::new().with_device(SimDevice::new(0x50));
        sim.issue(Command::Start);
        sim.issue(Command::Transmit(0xA0));
        sim.issue(Command::Start);
        assert_eq!(sim.status(), status::REP_START);
        assert_eq!(sim.events()[2], BusEvent::Start { repeated: true });
    }

    #[test]
    fn test_latency_delays_completion() {
        let mut sim = SimController::new().with_latency(2);
        sim.issue(Command::Start);
        assert!(!sim.is_complete());
        assert!(!sim.is_complete());
        assert!(sim.is_complete());
    }

    #[test]
    fn test_reads_cycle_through_data() {
        let mut sim =
            SimController::new().with_device(SimDevice::new(0x50).with_read_data(&[1, 2]));
        sim.issue(Command::Start);
        sim.issue(Command::Transmit(0xA1));
        sim.issue(Command::Receive { ack: true });
        assert_eq!(sim.data(), 1);
        sim.issue(Command::Receive { ack: true });
        assert_eq!(sim.data(), 2);
        sim.issue(Command::Receive { ack: false });
        assert_eq!(sim.data(), 1);
        assert_eq!(sim.status(), status::MR_DATA_NACK);
    }
}
