//! Raspberry Pi backend: GPIO coils, a GPIO push button and a WS2812 ring
//! clocked out over SPI.

use crate::hardware::{Coils, Ring, Signal};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use skypointer_core::config::HardwareConfig;
use skypointer_core::hardware::{CoilDriver, LightRing, OperatorSignal, Rgb};
use skypointer_core::{PointerError, Result};

/// Eight SPI bits per WS2812 bit at this clock.
const SPI_CLOCK_HZ: u32 = 6_400_000;
const BIT_ONE: u8 = 0xF8;
const BIT_ZERO: u8 = 0xC0;
/// Low time that latches a frame: well over 50us at 6.4MHz.
const RESET_BYTES: usize = 48;

fn hw(e: impl std::fmt::Display) -> PointerError {
    PointerError::Hardware(e.to_string())
}

pub fn open(config: &HardwareConfig, ring_size: usize) -> anyhow::Result<(Coils, Ring, Signal)> {
    let gpio = Gpio::new()?;
    let mut pins = Vec::with_capacity(4);
    for pin in config.coil_pins {
        pins.push(gpio.get(pin)?.into_output_low());
    }
    let button = gpio.get(config.button_pin)?.into_input_pulldown();
    let bus = match config.ring_spi_bus {
        0 => Bus::Spi0,
        1 => Bus::Spi1,
        other => anyhow::bail!("unsupported SPI bus {other}"),
    };
    let spi = Spi::new(bus, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)?;
    tracing::info!(coils = ?config.coil_pins, button = config.button_pin, ring_size, "gpio ready");
    Ok((
        Box::new(GpioCoils { pins }),
        Box::new(SpiRing::new(spi, ring_size)),
        Box::new(Button { pin: button }),
    ))
}

struct GpioCoils {
    pins: Vec<OutputPin>,
}

impl CoilDriver for GpioCoils {
    fn energize(&mut self, coils: [bool; 4]) -> Result<()> {
        for (pin, on) in self.pins.iter_mut().zip(coils) {
            if on {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
        Ok(())
    }
}

struct Button {
    pin: InputPin,
}

impl OperatorSignal for Button {
    fn is_pressed(&mut self) -> Result<bool> {
        Ok(self.pin.is_high())
    }
}

struct SpiRing {
    spi: Spi,
    len: usize,
    buffer: Vec<u8>,
}

impl SpiRing {
    fn new(spi: Spi, len: usize) -> Self {
        Self {
            spi,
            len,
            buffer: Vec::with_capacity(RESET_BYTES * 2 + len * 24),
        }
    }
}

/// Expand one colour byte into eight SPI bytes, most significant bit first.
fn encode_byte(value: u8, out: &mut Vec<u8>) {
    for bit in (0..8).rev() {
        out.push(if (value >> bit) & 1 == 1 { BIT_ONE } else { BIT_ZERO });
    }
}

fn encode_frame(cells: &[Rgb], out: &mut Vec<u8>) {
    out.clear();
    out.resize(RESET_BYTES, 0);
    for &Rgb(r, g, b) in cells {
        // WS2812 wants green first
        encode_byte(g, out);
        encode_byte(r, out);
        encode_byte(b, out);
    }
    out.resize(out.len() + RESET_BYTES, 0);
}

impl LightRing for SpiRing {
    fn len(&self) -> usize {
        self.len
    }

    fn show(&mut self, cells: &[Rgb]) -> Result<()> {
        if cells.len() != self.len {
            return Err(PointerError::Hardware(format!(
                "frame has {} cells, ring has {}",
                cells.len(),
                self.len
            )));
        }
        encode_frame(cells, &mut self.buffer);
        self.spi.write(&self.buffer).map_err(hw)?;
        Ok(())
    }
}
