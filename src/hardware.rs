use core::cell::RefCell;

use defmt::{error, info, Debug2Format};
use embassy_embedded_hal::shared_bus::blocking::i2c::I2cDevice;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{I2C1, SPI1};
use embassy_rp::spi::{self, Spi};
use embassy_rp::Peripherals;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use static_cell::StaticCell;

use crate::ads7828::{Ads7828, CellAdc};
use crate::mcp2515::{Mcp2515, TIMING_8MHZ_500KBPS};

const ADC_I2C_FREQUENCY_HZ: u32 = 400_000;
/// ADS7828 with A1=0 A0=0, wired to cell channels 0..7.
const ADC_LOW_ADDRESS: u8 = 0x48;
/// ADS7828 with A1=0 A0=1, wired to cell channels 8..11.
const ADC_HIGH_ADDRESS: u8 = 0x49;
const CAN_SPI_FREQUENCY_HZ: u32 = 1_000_000;

pub type AdcBus = I2c<'static, I2C1, i2c::Blocking>;
pub type AdcDevice = I2cDevice<'static, CriticalSectionRawMutex, AdcBus>;
pub type CanController =
    Mcp2515<ExclusiveDevice<Spi<'static, SPI1, spi::Blocking>, Output<'static>, NoDelay>>;

static ADC_BUS: StaticCell<Mutex<CriticalSectionRawMutex, RefCell<AdcBus>>> = StaticCell::new();

pub struct Hardware {
    pub adc: CellAdc<AdcDevice>,
    pub can: CanController,
    /// Toggled once per sampling tick to scope the tick timing.
    pub heartbeat: Output<'static>,
}

pub fn init(p: Peripherals) -> Hardware {
    let heartbeat = Output::new(p.PIN_25, Level::Low);

    let mut i2c_cfg = i2c::Config::default();
    i2c_cfg.frequency = ADC_I2C_FREQUENCY_HZ;
    // SCL = GPIO19, SDA = GPIO18
    let i2c1 = I2c::new_blocking(p.I2C1, p.PIN_19, p.PIN_18, i2c_cfg);
    let bus = ADC_BUS.init(Mutex::new(RefCell::new(i2c1)));

    let adc = CellAdc::new(
        Ads7828::new(I2cDevice::new(bus), ADC_LOW_ADDRESS),
        Ads7828::new(I2cDevice::new(bus), ADC_HIGH_ADDRESS),
    );
    info!("Cell ADCs on I2C1 at {:#x} / {:#x}", ADC_LOW_ADDRESS, ADC_HIGH_ADDRESS);

    let mut spi_cfg = spi::Config::default();
    spi_cfg.frequency = CAN_SPI_FREQUENCY_HZ;
    // SCK = GPIO10, MOSI = GPIO11, MISO = GPIO12, CS = GPIO13
    let spi1 = Spi::new_blocking(p.SPI1, p.PIN_10, p.PIN_11, p.PIN_12, spi_cfg);
    let cs = Output::new(p.PIN_13, Level::High);
    let mut can = Mcp2515::new(ExclusiveDevice::new_no_delay(spi1, cs));

    // A controller that fails here just drops every frame; sampling still runs.
    match can.init(&TIMING_8MHZ_500KBPS) {
        Ok(()) => info!("MCP2515 up, 500 kbit/s"),
        Err(e) => error!("MCP2515 init failed: {}", Debug2Format(&e)),
    }

    Hardware { adc, can, heartbeat }
}
