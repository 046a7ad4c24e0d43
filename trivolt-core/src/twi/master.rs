//! Bus master protocol engine
//!
//! [`TwiMaster`] owns the controller, so only one transaction can be in
//! flight. State follows the bus:
//!
//! ```text
//!        start / start_wait ok
//! Idle ─────────────────────────▶ Addressed ──┐ write / read_ack / read_nack
//!  ▲                                 │  ▲      │ repeated_start
//!  └──────────── stop ───────────────┘  └──────┘
//! ```
//!
//! A failed start leaves the engine `Idle`. Stops are only generated when
//! the caller asks for one, or to release the bus after an address phase
//! nobody acknowledged.

use trivolt_hal::twi::{status, BitTiming, Command, TwiController};

use super::error::{Phase, TwiError};
use super::Address;
use crate::config::BusConfig;

/// Poll budget for a single controller wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timeout {
    /// Give up after this many unsuccessful polls
    Polls(u32),
    /// Spin until the controller answers
    Never,
}

impl Default for Timeout {
    fn default() -> Self {
        Timeout::Polls(50_000)
    }
}

impl Timeout {
    fn expired(&self, polls: u32) -> bool {
        match self {
            Timeout::Polls(limit) => polls >= *limit,
            Timeout::Never => false,
        }
    }
}

/// How many times [`TwiMaster::start_wait`] reopens a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RetryPolicy {
    /// Retry at most this many times after the first attempt
    Bounded(u32),
    /// Retry until the device acknowledges
    Forever,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Bounded(1_000)
    }
}

impl RetryPolicy {
    fn allows(&self, retries: u32) -> bool {
        match self {
            RetryPolicy::Bounded(limit) => retries <= *limit,
            RetryPolicy::Forever => true,
        }
    }
}

/// Where the engine is in the transaction cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// No transaction open
    Idle,
    /// A device acknowledged this address; data phases may follow
    Addressed(Address),
}

/// Two-wire bus master
pub struct TwiMaster<C> {
    controller: C,
    timing: BitTiming,
    timeout: Timeout,
    retry: RetryPolicy,
    state: BusState,
    retries: u32,
}

impl<C: TwiController> TwiMaster<C> {
    /// Create an engine around `controller`
    ///
    /// The controller is not touched until [`init`](Self::init).
    pub fn new(controller: C, timing: BitTiming) -> Self {
        Self {
            controller,
            timing,
            timeout: Timeout::default(),
            retry: RetryPolicy::default(),
            state: BusState::Idle,
            retries: 0,
        }
    }

    /// Create an engine with timing and policies from `config`
    pub fn with_config(controller: C, config: &BusConfig) -> Self {
        Self::new(controller, config.timing())
            .with_timeout(config.timeout())
            .with_retry(config.retry())
    }

    /// Set the poll budget for each controller wait
    pub fn with_timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the ack-polling policy for [`start_wait`](Self::start_wait)
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Configure the bus lines and bit rate and enable the controller
    ///
    /// Safe to call more than once.
    pub fn init(&mut self) {
        self.controller.enable(self.timing);
    }

    /// Current transaction state
    pub fn state(&self) -> BusState {
        self.state
    }

    /// Whether no transaction is open
    pub fn is_idle(&self) -> bool {
        self.state == BusState::Idle
    }

    /// Stop-and-retry cycles the last [`start_wait`](Self::start_wait) needed
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Bit timing applied by [`init`](Self::init)
    pub fn timing(&self) -> BitTiming {
        self.timing
    }

    /// Borrow the controller
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Mutably borrow the controller
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Give back the controller
    pub fn release(self) -> C {
        self.controller
    }

    /// Issue a start condition and send `address`
    ///
    /// Fails with [`TwiError::Bus`] when the start condition is not
    /// confirmed and with [`TwiError::Nack`] when no device acknowledges
    /// the address. An unacknowledged address phase is closed with a stop
    /// so the bus is free again. Never retries.
    pub fn start(&mut self, address: Address) -> Result<(), TwiError> {
        self.controller.issue(Command::Start);
        self.wait_complete(Phase::Start)?;

        let st = self.status();
        if st != status::START && st != status::REP_START {
            self.state = BusState::Idle;
            return Err(TwiError::Bus {
                phase: Phase::Start,
                status: st,
            });
        }

        self.controller.issue(Command::Transmit(address.byte()));
        self.wait_complete(Phase::Address)?;

        match self.status() {
            status::MT_SLA_ACK | status::MR_SLA_ACK => {
                self.state = BusState::Addressed(address);
                Ok(())
            }
            status::MT_SLA_NACK | status::MR_SLA_NACK => {
                self.stop()?;
                Err(TwiError::Nack(Phase::Address))
            }
            st => {
                self.state = BusState::Idle;
                Err(TwiError::Bus {
                    phase: Phase::Address,
                    status: st,
                })
            }
        }
    }

    /// Open a transaction, polling until a busy device acknowledges
    ///
    /// Each unacknowledged attempt is followed by a stop before the next
    /// start. A start condition the controller rejects is retried the same
    /// way. The number of retries is bounded by the [`RetryPolicy`];
    /// exhausting it returns [`TwiError::RetriesExhausted`].
    pub fn start_wait(&mut self, address: Address) -> Result<(), TwiError> {
        self.retries = 0;

        loop {
            match self.start(address) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() => {
                    if !self.retry.allows(self.retries + 1) {
                        #[cfg(feature = "defmt")]
                        defmt::warn!(
                            "twi: {=u8:#x} still busy after {=u32} retries",
                            address.address(),
                            self.retries
                        );
                        return Err(TwiError::RetriesExhausted {
                            attempts: self.retries + 1,
                        });
                    }
                    self.retries += 1;
                    #[cfg(feature = "defmt")]
                    defmt::debug!("twi: {=u8:#x} busy, retry {=u32}", address.address(), self.retries);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Issue a start without a preceding stop
    ///
    /// Identical to [`start`](Self::start); the controller reports a
    /// repeated start when a transaction is already open.
    pub fn repeated_start(&mut self, address: Address) -> Result<(), TwiError> {
        self.start(address)
    }

    /// Send one byte on the open transaction
    ///
    /// Succeeds only if the device acknowledged. A NACK leaves the
    /// transaction open; closing it is up to the caller.
    pub fn write(&mut self, byte: u8) -> Result<(), TwiError> {
        self.ensure_open()?;

        self.controller.issue(Command::Transmit(byte));
        self.wait_complete(Phase::Data)?;

        match self.status() {
            status::MT_DATA_ACK => Ok(()),
            status::MT_DATA_NACK => Err(TwiError::Nack(Phase::Data)),
            st => Err(TwiError::Bus {
                phase: Phase::Data,
                status: st,
            }),
        }
    }

    /// Send several bytes, stopping at the first one not acknowledged
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), TwiError> {
        for &byte in bytes {
            self.write(byte)?;
        }
        Ok(())
    }

    /// Receive one byte and acknowledge it (more bytes will follow)
    pub fn read_ack(&mut self) -> Result<u8, TwiError> {
        self.read(true)
    }

    /// Receive one byte without acknowledging it (last byte before stop)
    pub fn read_nack(&mut self) -> Result<u8, TwiError> {
        self.read(false)
    }

    /// Issue a stop condition and wait until the bus is released
    pub fn stop(&mut self) -> Result<(), TwiError> {
        self.controller.issue(Command::Stop);
        self.state = BusState::Idle;

        let mut polls = 0u32;
        while self.controller.is_stopping() {
            polls += 1;
            if self.timeout.expired(polls) {
                #[cfg(feature = "defmt")]
                defmt::warn!("twi: bus not released after stop");
                return Err(TwiError::Timeout(Phase::Stop));
            }
            core::hint::spin_loop();
        }
        Ok(())
    }

    fn read(&mut self, ack: bool) -> Result<u8, TwiError> {
        self.ensure_open()?;

        self.controller.issue(Command::Receive { ack });
        self.wait_complete(Phase::Receive)?;
        Ok(self.controller.data())
    }

    fn ensure_open(&self) -> Result<(), TwiError> {
        match self.state {
            BusState::Addressed(_) => Ok(()),
            BusState::Idle => Err(TwiError::NoTransaction),
        }
    }

    fn status(&mut self) -> u8 {
        self.controller.status() & status::MASK
    }

    /// Spin until the controller flags completion
    ///
    /// On timeout the transaction is abandoned and the engine is idle.
    fn wait_complete(&mut self, phase: Phase) -> Result<(), TwiError> {
        let mut polls = 0u32;
        while !self.controller.is_complete() {
            polls += 1;
            if self.timeout.expired(polls) {
                self.state = BusState::Idle;
                #[cfg(feature = "defmt")]
                defmt::warn!("twi: controller timeout in {}", phase);
                return Err(TwiError::Timeout(phase));
            }
            core::hint::spin_loop();
        }
        Ok(())
    }
}
