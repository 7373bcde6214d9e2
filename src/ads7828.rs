use bmb_core::config::CHANNEL_COUNT;
use bmb_core::SampleSource;
use embedded_hal_1::i2c::I2c;

/// Single-ended channel select bits (C2 C1 C0), in channel order.
const ADS7828_CHANNEL_MAP: [u8; 8] = [
    0b00000000,
    0b01000000,
    0b00010000,
    0b01010000,
    0b00100000,
    0b01100000,
    0b00110000,
    0b01110000,
];

const SINGLE_ENDED: u8 = 0b1000_0000;
const CONVERTER_ON: u8 = 0b0000_0100;

pub const CHANNELS_PER_DEVICE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ads7828Error<E> {
    I2c(E),
    Channel(u8),
}

/// ADS7828 8-channel 12-bit ADC on an I2C bus.
pub struct Ads7828<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Ads7828<I2C> {
    /// `address` is the 7-bit bus address. The cell ADCs run from the
    /// board's external reference; the internal one is never powered.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    fn command_byte(channel: u8) -> Option<u8> {
        let select = *ADS7828_CHANNEL_MAP.get(channel as usize)?;
        Some(SINGLE_ENDED | select | CONVERTER_ON)
    }

    /// One 12-bit conversion of `channel` (0..7).
    pub fn read_channel(&mut self, channel: u8) -> Result<u16, Ads7828Error<I2C::Error>> {
        let cmd = Self::command_byte(channel)
            .ok_or(Ads7828Error::Channel(channel))?;

        let mut buf = [0; 2];
        self.i2c
            .write_read(self.address, &[cmd], &mut buf)
            .map_err(Ads7828Error::I2c)?;

        Ok((((buf[0] & 0x0F) as u16) << 8) | (buf[1] as u16))
    }

    /// Converts every channel whose bit is set in `mask` into `out`.
    pub fn read_masked(
        &mut self,
        mask: u8,
        out: &mut [u16],
    ) -> Result<(), Ads7828Error<I2C::Error>> {
        for (ch, slot) in out.iter_mut().enumerate().take(CHANNELS_PER_DEVICE) {
            if mask & (1 << ch) != 0 {
                *slot = self.read_channel(ch as u8)?;
            }
        }
        Ok(())
    }
}

/// The two converters carrying the twelve cell taps: device A holds
/// channels 0..7, device B channels 8..11.
pub struct CellAdc<I2C> {
    low: Ads7828<I2C>,
    high: Ads7828<I2C>,
}

impl<I2C: I2c> CellAdc<I2C> {
    pub fn new(low: Ads7828<I2C>, high: Ads7828<I2C>) -> Self {
        Self { low, high }
    }
}

impl<I2C: I2c> SampleSource for CellAdc<I2C> {
    type Error = Ads7828Error<I2C::Error>;

    fn sample(&mut self, mask: u16, out: &mut [u16; CHANNEL_COUNT]) -> Result<(), Self::Error> {
        let (low, high) = out.split_at_mut(CHANNELS_PER_DEVICE);
        self.low.read_masked(mask as u8, low)?;
        self.high
            .read_masked((mask >> CHANNELS_PER_DEVICE) as u8, high)?;
        Ok(())
    }
}
