//! Serial transport to the panel.
//!
//! Owns the open port behind a mutex so a bitmap transfer (header, settle
//! delay, payload, flush) is atomic with respect to any other command. The
//! protocol is fire-and-forget: nothing is ever read back, and a failed
//! region write is not retried here. The compositor resends the full frame
//! on the next cycle instead.

pub mod fake;

use std::io::Write;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPortType, StopBits};

use crate::canvas::Region;
use crate::proto::{self, Opcode};
use crate::{Error, Result};

/// Bridge chip on every known panel revision (CH340/CH552).
const USB_VID: u16 = 0x1A86;

/// Minimum wait between the bitmap header and its payload. The bridge
/// needs it to latch the target window; without it rows shear.
const SETTLE_DELAY: Duration = Duration::from_millis(1);

const RESET_DELAY: Duration = Duration::from_millis(200);
const INIT_DELAY: Duration = Duration::from_millis(50);

/// Byte sink the transport writes frames into. Production wraps a serial
/// port; tests substitute a capture buffer.
pub trait WireLink: Send {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
}

impl WireLink for SerialLink {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SerialOptions {
    pub baud: u32,
    pub timeout: Duration,
}

impl Default for SerialOptions {
    fn default() -> Self {
        Self {
            baud: 115_200,
            timeout: Duration::from_millis(1_000),
        }
    }
}

/// Find the panel's serial device. Matches on the bridge vendor id first,
/// then on the product string some units report.
pub fn detect_port() -> Result<String> {
    let ports = serialport::available_ports().map_err(map_serial_error)?;
    for port in &ports {
        if let SerialPortType::UsbPort(usb) = &port.port_type {
            if usb.vid == USB_VID {
                return Ok(port.port_name.clone());
            }
            if let Some(product) = &usb.product {
                let product = product.to_ascii_uppercase();
                if product.contains("CH340") || product.contains("USB35INCH") {
                    return Ok(port.port_name.clone());
                }
            }
        }
    }
    Err(Error::Config(
        "no panel found; pass --device or set one in the config".to_string(),
    ))
}

pub struct Transport {
    link: Mutex<Option<Box<dyn WireLink>>>,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            link: Mutex::new(None),
        }
    }

    /// Wrap an already-open link (tests, alternative byte sinks).
    pub fn from_link(link: Box<dyn WireLink>) -> Self {
        Self {
            link: Mutex::new(Some(link)),
        }
    }

    /// Open the serial device. `"auto"` scans for the panel's USB bridge.
    /// 8N1 with hardware flow control; the panel asserts CTS while its
    /// buffer drains during bitmap transfers.
    pub fn connect(&self, device: &str, options: SerialOptions) -> Result<()> {
        let device = if device == "auto" {
            detect_port()?
        } else {
            device.to_string()
        };

        let port = serialport::new(&device, options.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::Hardware)
            .timeout(options.timeout)
            .open()
            .map_err(map_serial_error)?;

        *self.lock() = Some(Box::new(SerialLink { port }));
        Ok(())
    }

    /// Best-effort shutdown: blank the panel, then drop the port. Errors
    /// are ignored; the device may already be unplugged.
    pub fn disconnect(&self) {
        let mut guard = self.lock();
        if let Some(link) = guard.as_mut() {
            let _ = link.write_all(&proto::command_frame(Opcode::ScreenOff));
            let _ = link.flush();
        }
        *guard = None;
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }

    /// Bring a freshly connected panel to a known state.
    pub fn init_display(&self, brightness: u8) -> Result<()> {
        self.send_command(Opcode::Reset)?;
        thread::sleep(RESET_DELAY);
        self.send_command(Opcode::ScreenOn)?;
        thread::sleep(INIT_DELAY);
        self.set_brightness(brightness)
    }

    /// Send a simple command frame, retrying once. Commands are cheap and
    /// idempotent, unlike region payloads.
    pub fn send_command(&self, opcode: Opcode) -> Result<()> {
        self.write_frame_with_retry(&proto::command_frame(opcode))
    }

    pub fn set_brightness(&self, level: u8) -> Result<()> {
        self.write_frame_with_retry(&proto::brightness_frame(level))
    }

    pub fn clear(&self) -> Result<()> {
        self.send_command(Opcode::Clear)
    }

    /// Transmit one region: addressing header, settle delay, pixel payload,
    /// flush. Held under the lock end to end; interleaving another frame
    /// mid-transfer corrupts the panel state machine.
    pub fn send_region(&self, region: &Region) -> Result<()> {
        let header = proto::bitmap_header(
            region.x,
            region.y,
            region.x + region.width - 1,
            region.y + region.height - 1,
        );

        let mut guard = self.lock();
        let link = guard.as_mut().ok_or(Error::NotConnected)?;
        link.write_all(&header)?;
        thread::sleep(SETTLE_DELAY);
        link.write_all(&region.pixels)?;
        link.flush()
    }

    fn write_frame_with_retry(&self, frame: &[u8]) -> Result<()> {
        let mut guard = self.lock();
        let link = guard.as_mut().ok_or(Error::NotConnected)?;
        match write_frame(link.as_mut(), frame) {
            Ok(()) => Ok(()),
            Err(_) => write_frame(link.as_mut(), frame),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Box<dyn WireLink>>> {
        // Writes never panic while holding the lock; recover the guard
        // rather than poisoning every later cycle.
        match self.link.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

fn write_frame(link: &mut dyn WireLink, frame: &[u8]) -> Result<()> {
    link.write_all(frame)?;
    link.flush()
}

fn map_serial_error(err: serialport::Error) -> Error {
    use serialport::ErrorKind;
    use std::io;

    let kind = match err.kind() {
        ErrorKind::NoDevice => io::ErrorKind::NotFound,
        ErrorKind::InvalidInput => io::ErrorKind::InvalidInput,
        ErrorKind::Io(inner) => inner,
        ErrorKind::Unknown => io::ErrorKind::Other,
    };

    Error::Io(io::Error::new(kind, err))
}

#[cfg(test)]
mod tests {
    use super::fake::FakeLink;
    use super::*;
    use crate::canvas::{Rect, Region};
    use embedded_graphics::pixelcolor::Rgb888;
    use embedded_graphics::prelude::RgbColor;

    #[test]
    fn commands_are_six_byte_frames() {
        let (link, log) = FakeLink::new();
        let transport = Transport::from_link(Box::new(link));

        transport.send_command(Opcode::ScreenOn).unwrap();
        transport.set_brightness(75).unwrap();

        let bytes = log.bytes();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[..6], &[0, 0, 0, 0, 0, 109]);
        assert_eq!(&bytes[6..], &[75, 0, 0, 0, 0, 110]);
    }

    #[test]
    fn region_send_writes_header_then_payload() {
        let (link, log) = FakeLink::new();
        let transport = Transport::from_link(Box::new(link));

        let region = Region::solid(Rect::new(10, 100, 300, 30), Rgb888::WHITE).unwrap();
        transport.send_region(&region).unwrap();

        let bytes = log.bytes();
        assert_eq!(bytes.len(), 6 + 300 * 30 * 2);
        assert_eq!(&bytes[..6], &[2, 134, 68, 212, 129, 197]);
        assert_eq!(&bytes[6..8], &[0xFF, 0xFF]);
        // Header and payload land as separate writes with a flush after.
        assert_eq!(log.write_lens(), vec![6, 300 * 30 * 2]);
        assert_eq!(log.flushes(), 1);
    }

    #[test]
    fn commands_retry_once_then_fail() {
        let (link, log) = FakeLink::new();
        log.fail_next_writes(1);
        let transport = Transport::from_link(Box::new(link));
        transport.send_command(Opcode::Clear).unwrap();
        assert_eq!(log.bytes().len(), 6);

        log.fail_next_writes(2);
        assert!(transport.send_command(Opcode::Clear).is_err());
    }

    #[test]
    fn region_send_does_not_retry() {
        let (link, log) = FakeLink::new();
        log.fail_next_writes(1);
        let transport = Transport::from_link(Box::new(link));
        let region = Region::solid(Rect::new(0, 0, 4, 4), Rgb888::WHITE).unwrap();
        assert!(transport.send_region(&region).is_err());
        assert!(log.bytes().is_empty());
    }

    #[test]
    fn disconnected_transport_reports_not_connected() {
        let transport = Transport::new();
        assert!(!transport.is_connected());
        let err = transport.send_command(Opcode::ScreenOn).unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[test]
    fn disconnect_blanks_the_panel() {
        let (link, log) = FakeLink::new();
        let transport = Transport::from_link(Box::new(link));
        transport.disconnect();
        assert!(!transport.is_connected());
        assert_eq!(log.bytes(), vec![0, 0, 0, 0, 0, 108]);
    }

    #[test]
    fn init_sequence_orders_reset_on_brightness() {
        let (link, log) = FakeLink::new();
        let transport = Transport::from_link(Box::new(link));
        transport.init_display(40).unwrap();

        let bytes = log.bytes();
        assert_eq!(bytes.len(), 18);
        assert_eq!(bytes[5], 101);
        assert_eq!(bytes[11], 109);
        assert_eq!(&bytes[12..], &[40, 0, 0, 0, 0, 110]);
    }
}
