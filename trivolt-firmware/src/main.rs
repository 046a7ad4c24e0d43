//! Trivolt - Three-Channel Voltmeter Firmware
//!
//! Samples three analog inputs, scales them to volts and shows them on a
//! 16x2 character LCD driven over a two-wire bus.
//!
//! Wiring (RP2040):
//! - GPIO4: SDA, GPIO5: SCL (external pull-ups)
//! - GPIO26/27/28: ADC0/1/2

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
use embassy_rp::gpio::Pull;
use embassy_time::{Delay, Timer};
use {defmt_rtt as _, panic_probe as _};

use trivolt_core::lcd::command::ROWS;
use trivolt_core::lcd::Lcd;
use trivolt_core::meter::{read_channels, Dashboard};
use trivolt_core::twi::TwiMaster;
use trivolt_drivers::BitBangTwi;
use trivolt_hal_rp2040::{AdcChannel, BlockingAdc, OpenDrain};

mod config;

/// Wait before retrying a display that did not come up (ms)
const LCD_RETRY_MS: u64 = 1_000;

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Trivolt firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load();

    // Two-wire bus on GPIO4/GPIO5
    let twi = BitBangTwi::new(OpenDrain::new(p.PIN_4), OpenDrain::new(p.PIN_5), Delay);
    let bus = TwiMaster::with_config(twi, &config.bus);
    let mut lcd = Lcd::new(bus, Delay, &config.display);

    let adc = BlockingAdc::new(Adc::new_blocking(p.ADC, AdcConfig::default()))
        .with_channel(AdcChannel::Adc0, Channel::new_pin(p.PIN_26, Pull::None))
        .and_then(|adc| adc.with_channel(AdcChannel::Adc1, Channel::new_pin(p.PIN_27, Pull::None)))
        .and_then(|adc| adc.with_channel(AdcChannel::Adc2, Channel::new_pin(p.PIN_28, Pull::None)));
    let mut adc = match adc {
        Ok(adc) => adc,
        Err(e) => {
            error!("ADC setup failed: {}", e);
            return;
        }
    };

    while let Err(e) = lcd.init() {
        error!("LCD init failed: {}", e);
        Timer::after_millis(LCD_RETRY_MS).await;
    }
    info!("LCD ready at {=u8:#x}", lcd.address());

    let dashboard = Dashboard::new(&config);
    let mut delay = Delay;

    loop {
        match read_channels(&mut adc, &config, &mut delay) {
            Ok(readings) => {
                for row in 0..ROWS {
                    if let Ok(text) = dashboard.row_text(row, &readings) {
                        debug!("row {}: {}", row, text.as_str());
                    }
                }
                if let Err(e) = dashboard.render(&mut lcd, &readings) {
                    warn!("Display update failed: {}", e);
                }
            }
            Err(e) => warn!("Sampling failed: {}", e),
        }

        Timer::after_millis(config.refresh_ms as u64).await;
    }
}
