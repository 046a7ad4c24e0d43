//! Open-drain bus model with one target device, for host tests
//!
//! The master side drives [`WirePin`]s; every change of the wired-AND line
//! levels is fed to [`Target`], which decodes start, stop and clock edges
//! the way a real device does and drives SDA for acknowledges and read
//! data.

use core::cell::RefCell;
use std::vec::Vec;

use trivolt_hal::OpenDrainPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Sda,
    Scl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetState {
    Idle,
    Receiving { shift: u8, bits: u8, address: bool },
    Acking { read: bool },
    Sending { byte: u8, bits: u8 },
    MasterAck { acked: Option<bool> },
    Ignoring,
}

/// Device at a fixed 7-bit address
#[derive(Debug)]
pub struct Target {
    address: u8,
    busy_for: u16,
    accept: usize,
    read_data: Vec<u8>,
    read_pos: usize,
    written: usize,
    sda_low: bool,
    state: TargetState,
    pub received: Vec<u8>,
    pub master_acks: Vec<bool>,
    pub starts: u32,
    pub stops: u32,
}

impl Target {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            busy_for: 0,
            accept: usize::MAX,
            read_data: Vec::new(),
            read_pos: 0,
            written: 0,
            sda_low: false,
            state: TargetState::Idle,
            received: Vec::new(),
            master_acks: Vec::new(),
            starts: 0,
            stops: 0,
        }
    }

    pub fn busy_for(mut self, attempts: u16) -> Self {
        self.busy_for = attempts;
        self
    }

    pub fn accept_bytes(mut self, count: usize) -> Self {
        self.accept = count;
        self
    }

    pub fn with_read_data(mut self, data: &[u8]) -> Self {
        self.read_data = data.to_vec();
        self
    }

    fn next_read(&mut self) -> u8 {
        if self.read_data.is_empty() {
            return 0xFF;
        }
        let value = self.read_data[self.read_pos % self.read_data.len()];
        self.read_pos += 1;
        value
    }

    fn send(&mut self) {
        let byte = self.next_read();
        self.sda_low = byte & 0x80 == 0;
        self.state = TargetState::Sending { byte, bits: 0 };
    }

    fn start(&mut self) {
        self.starts += 1;
        self.sda_low = false;
        self.state = TargetState::Receiving {
            shift: 0,
            bits: 0,
            address: true,
        };
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.sda_low = false;
        self.state = TargetState::Idle;
    }

    fn clock_rise(&mut self, sda: bool) {
        match self.state {
            TargetState::Receiving {
                shift,
                bits,
                address,
            } if bits < 8 => {
                self.state = TargetState::Receiving {
                    shift: (shift << 1) | sda as u8,
                    bits: bits + 1,
                    address,
                };
            }
            TargetState::MasterAck { acked: None } => {
                self.master_acks.push(!sda);
                self.state = TargetState::MasterAck { acked: Some(!sda) };
            }
            _ => {}
        }
    }

    fn clock_fall(&mut self) {
        match self.state {
            TargetState::Receiving {
                shift,
                bits: 8,
                address: true,
            } => {
                if shift >> 1 != self.address {
                    self.state = TargetState::Ignoring;
                } else if self.busy_for > 0 {
                    self.busy_for -= 1;
                    self.state = TargetState::Ignoring;
                } else {
                    self.written = 0;
                    self.sda_low = true;
                    self.state = TargetState::Acking {
                        read: shift & 0x01 != 0,
                    };
                }
            }
            TargetState::Receiving {
                shift,
                bits: 8,
                address: false,
            } => {
                self.received.push(shift);
                if self.written < self.accept {
                    self.sda_low = true;
                    self.state = TargetState::Acking { read: false };
                } else {
                    self.state = TargetState::Ignoring;
                }
                self.written += 1;
            }
            TargetState::Acking { read: true } => self.send(),
            TargetState::Acking { read: false } => {
                self.sda_low = false;
                self.state = TargetState::Receiving {
                    shift: 0,
                    bits: 0,
                    address: false,
                };
            }
            TargetState::Sending { byte, bits } => {
                let bits = bits + 1;
                if bits == 8 {
                    self.sda_low = false;
                    self.state = TargetState::MasterAck { acked: None };
                } else {
                    self.sda_low = (byte << bits) & 0x80 == 0;
                    self.state = TargetState::Sending { byte, bits };
                }
            }
            TargetState::MasterAck { acked: Some(true) } => self.send(),
            TargetState::MasterAck { .. } => {
                self.sda_low = false;
                self.state = TargetState::Ignoring;
            }
            _ => {}
        }
    }
}

/// Both bus lines plus the attached device
#[derive(Debug)]
pub struct Wire {
    master_sda_low: bool,
    master_scl_low: bool,
    stretch_polls: u32,
    stretching: u32,
    pub sda_stuck: bool,
    pub scl_stuck: bool,
    pub target: Target,
}

impl Wire {
    pub fn new(target: Target) -> RefCell<Self> {
        RefCell::new(Self {
            master_sda_low: false,
            master_scl_low: false,
            stretch_polls: 0,
            stretching: 0,
            sda_stuck: false,
            scl_stuck: false,
            target,
        })
    }

    /// Hold SCL low for this many reads after each master release
    pub fn set_stretch(&mut self, polls: u32) {
        self.stretch_polls = polls;
    }

    fn sda(&self) -> bool {
        !(self.master_sda_low || self.target.sda_low || self.sda_stuck)
    }

    fn scl(&self) -> bool {
        !(self.master_scl_low || self.stretching > 0 || self.scl_stuck)
    }

    fn drive(&mut self, line: Line, low: bool) {
        let before = (self.sda(), self.scl());
        match line {
            Line::Sda => self.master_sda_low = low,
            Line::Scl => {
                if self.master_scl_low && !low {
                    self.stretching = self.stretch_polls;
                }
                self.master_scl_low = low;
            }
        }
        self.settle(before);
    }

    fn read(&mut self, line: Line) -> bool {
        if line == Line::Scl && self.stretching > 0 {
            let before = (self.sda(), self.scl());
            self.stretching -= 1;
            self.settle(before);
        }
        match line {
            Line::Sda => self.sda(),
            Line::Scl => self.scl(),
        }
    }

    fn settle(&mut self, (sda0, scl0): (bool, bool)) {
        let (sda1, scl1) = (self.sda(), self.scl());
        if scl0 && scl1 {
            if sda0 && !sda1 {
                self.target.start();
            } else if !sda0 && sda1 {
                self.target.stop();
            }
        } else if !scl0 && scl1 {
            self.target.clock_rise(sda1);
        } else if scl0 && !scl1 {
            self.target.clock_fall();
        }
    }
}

/// Master end of one bus line
pub struct WirePin<'a> {
    wire: &'a RefCell<Wire>,
    line: Line,
}

impl<'a> WirePin<'a> {
    pub fn pair(wire: &'a RefCell<Wire>) -> (Self, Self) {
        (
            Self {
                wire,
                line: Line::Sda,
            },
            Self {
                wire,
                line: Line::Scl,
            },
        )
    }
}

impl OpenDrainPin for WirePin<'_> {
    fn release(&mut self) {
        self.wire.borrow_mut().drive(self.line, false);
    }

    fn drive_low(&mut self) {
        self.wire.borrow_mut().drive(self.line, true);
    }

    fn is_high(&self) -> bool {
        self.wire.borrow_mut().read(self.line)
    }
}
