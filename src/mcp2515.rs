use bmb_core::{Frame, FrameSink};
use embedded_hal_1::spi::{Operation, SpiDevice};

// SPI instructions
const CMD_RESET: u8 = 0xC0;
const CMD_READ: u8 = 0x03;
const CMD_WRITE: u8 = 0x02;
const CMD_BIT_MODIFY: u8 = 0x05;
const CMD_LOAD_TXB0: u8 = 0x40; // starts at TXB0SIDH
const CMD_RTS_TXB0: u8 = 0x81;

// Registers
const REG_CANSTAT: u8 = 0x0E;
const REG_CANCTRL: u8 = 0x0F;
const REG_CNF3: u8 = 0x28; // CNF2 and CNF1 follow
const REG_TXB0CTRL: u8 = 0x30;

const MODE_MASK: u8 = 0xE0;
const MODE_NORMAL: u8 = 0x00;
const MODE_CONFIG: u8 = 0x80;
const TXREQ: u8 = 0x08;

const MODE_POLL_ATTEMPTS: u32 = 64;
const MAX_STANDARD_ID: u16 = 0x7FF;
const MAX_DLC: usize = 8;

/// CNF1..3 values for one oscillator / bitrate pair.
#[derive(Debug, Clone, Copy)]
pub struct BitTiming {
    pub cnf1: u8,
    pub cnf2: u8,
    pub cnf3: u8,
}

/// 8 MHz crystal, 500 kbit/s: 8 TQ per bit, sample point at 62.5 %.
pub const TIMING_8MHZ_500KBPS: BitTiming = BitTiming {
    cnf1: 0x00,
    cnf2: 0x90,
    cnf3: 0x82,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mcp2515Error<E> {
    Spi(E),
    /// Controller did not report the requested mode; holds the last CANSTAT.
    ModeTimeout(u8),
    /// TX buffer still holds the previous frame.
    Busy,
    Id(u16),
    Length(usize),
}

/// MCP2515 standalone CAN controller, transmit side only (TX buffer 0).
pub struct Mcp2515<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Mcp2515<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Resets the controller, programs the bit timing and enters normal mode.
    pub fn init(&mut self, timing: &BitTiming) -> Result<(), Mcp2515Error<SPI::Error>> {
        self.spi.write(&[CMD_RESET]).map_err(Mcp2515Error::Spi)?;
        self.set_mode(MODE_CONFIG)?;
        self.write_registers(REG_CNF3, &[timing.cnf3, timing.cnf2, timing.cnf1])?;
        self.set_mode(MODE_NORMAL)
    }

    /// Queues one standard-id data frame without waiting for it to leave.
    pub fn try_transmit(&mut self, id: u16, data: &[u8]) -> Result<(), Mcp2515Error<SPI::Error>> {
        if id > MAX_STANDARD_ID {
            return Err(Mcp2515Error::Id(id));
        }
        if data.len() > MAX_DLC {
            return Err(Mcp2515Error::Length(data.len()));
        }
        if self.read_register(REG_TXB0CTRL)? & TXREQ != 0 {
            return Err(Mcp2515Error::Busy);
        }

        // SIDH, SIDL, EID8, EID0, DLC, data
        let mut buf = [0u8; 6 + MAX_DLC];
        buf[0] = CMD_LOAD_TXB0;
        buf[1] = (id >> 3) as u8;
        buf[2] = ((id & 0x07) << 5) as u8;
        buf[5] = data.len() as u8;
        buf[6..6 + data.len()].copy_from_slice(data);

        self.spi
            .write(&buf[..6 + data.len()])
            .map_err(Mcp2515Error::Spi)?;
        self.spi.write(&[CMD_RTS_TXB0]).map_err(Mcp2515Error::Spi)
    }

    fn set_mode(&mut self, mode: u8) -> Result<(), Mcp2515Error<SPI::Error>> {
        self.bit_modify(REG_CANCTRL, MODE_MASK, mode)?;
        let mut stat = 0;
        for _ in 0..MODE_POLL_ATTEMPTS {
            stat = self.read_register(REG_CANSTAT)?;
            if stat & MODE_MASK == mode {
                return Ok(());
            }
        }
        Err(Mcp2515Error::ModeTimeout(stat))
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Mcp2515Error<SPI::Error>> {
        let mut value = [0u8; 1];
        self.spi
            .transaction(&mut [
                Operation::Write(&[CMD_READ, reg]),
                Operation::Read(&mut value),
            ])
            .map_err(Mcp2515Error::Spi)?;
        Ok(value[0])
    }

    fn write_registers(&mut self, start: u8, values: &[u8]) -> Result<(), Mcp2515Error<SPI::Error>> {
        self.spi
            .transaction(&mut [
                Operation::Write(&[CMD_WRITE, start]),
                Operation::Write(values),
            ])
            .map_err(Mcp2515Error::Spi)
    }

    fn bit_modify(&mut self, reg: u8, mask: u8, value: u8) -> Result<(), Mcp2515Error<SPI::Error>> {
        self.spi
            .write(&[CMD_BIT_MODIFY, reg, mask, value])
            .map_err(Mcp2515Error::Spi)
    }
}

impl<SPI: SpiDevice> FrameSink for Mcp2515<SPI> {
    type Error = Mcp2515Error<SPI::Error>;

    fn try_send(&mut self, id: u16, frame: &Frame) -> Result<(), Self::Error> {
        self.try_transmit(id, frame.as_bytes())
    }
}
