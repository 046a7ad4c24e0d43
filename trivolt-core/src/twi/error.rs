//! Bus transfer errors

/// Step of a transaction an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Start or repeated start condition
    Start,
    /// Address+direction byte
    Address,
    /// Data byte sent by the master
    Data,
    /// Data byte received by the master
    Receive,
    /// Stop condition
    Stop,
}

/// Errors from the two-wire bus master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwiError {
    /// The device did not acknowledge (busy or rejecting)
    Nack(Phase),
    /// The controller reported an unexpected status code
    Bus {
        /// Phase the status was read after
        phase: Phase,
        /// Status register with the prescaler bits masked off
        status: u8,
    },
    /// The controller did not finish within the poll budget
    Timeout(Phase),
    /// Ack-polling gave up before the device answered
    RetriesExhausted {
        /// Address attempts made, including the first
        attempts: u32,
    },
    /// A data phase was requested with no transaction open
    NoTransaction,
}

impl TwiError {
    /// Whether the device may answer if the transaction is reopened later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TwiError::Nack(Phase::Address)
                | TwiError::Bus {
                    phase: Phase::Start,
                    ..
                }
        )
    }
}
