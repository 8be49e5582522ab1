use std::{
    io::{self, Read},
    time::Duration,
};
use log::warn;
use serialport::{SerialPort, SerialPortType};

use crate::error::{MonitorError, Result};

// Longest line we are willing to buffer without seeing a newline
const MAX_LINE_BYTES: usize = 1024;

/// Anything the ingestion loop can pull text lines from.
pub trait LineSource {
    /// Next complete line, or `None` if no full line is available yet.
    fn poll_line(&mut self) -> io::Result<Option<String>>;
}

/// Splits a raw byte stream into trimmed, non-empty text lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
    // Set after an overflow until the rest of that line has been skipped
    discarding: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        let bytes = if self.discarding {
            match bytes.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.discarding = false;
                    &bytes[pos + 1..]
                }
                None => return,
            }
        } else {
            bytes
        };

        self.pending.extend_from_slice(bytes);
        if self.pending.len() > MAX_LINE_BYTES && !self.pending.contains(&b'\n') {
            warn!("Dropping {} bytes without line terminator", self.pending.len());
            self.pending.clear();
            self.discarding = true;
        }
    }

    pub fn next_line(&mut self) -> Option<String> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }
}

pub struct SerialLineSource {
    port: Box<dyn SerialPort>,
    framer: LineFramer,
    buf: [u8; 256],
}

impl SerialLineSource {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            port,
            framer: LineFramer::new(),
            buf: [0; 256],
        }
    }
}

impl LineSource for SerialLineSource {
    fn poll_line(&mut self) -> io::Result<Option<String>> {
        if let Some(line) = self.framer.next_line() {
            return Ok(Some(line));
        }
        if self.port.bytes_to_read()? == 0 {
            return Ok(None);
        }
        match received(self.port.read(&mut self.buf))? {
            Some(n) => {
                self.framer.push(&self.buf[..n]);
                Ok(self.framer.next_line())
            }
            None => Ok(None),
        }
    }
}

/// Byte count of a port read, or `None` when the read should count as an
/// idle poll (nothing read, or the read timed out).
fn received(read: io::Result<usize>) -> io::Result<Option<usize>> {
    match read {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn open_port(name: &str, baud_rate: u32, timeout: Duration) -> Result<Box<dyn SerialPort>> {
    serialport::new(name, baud_rate)
        .timeout(timeout)
        .open()
        .map_err(|e| MonitorError::serial_open(name, e))
}

// Port names with a short description, for --list-ports
pub fn list_ports() -> Result<Vec<String>> {
    let mut out: Vec<String> = serialport::available_ports()?
        .into_iter()
        .map(|p| match p.port_type {
            SerialPortType::UsbPort(info) => {
                let product = info.product.unwrap_or_else(|| "USB serial".to_string());
                format!("{} ({}, {:04x}:{:04x})", p.port_name, product, info.vid, info.pid)
            }
            SerialPortType::BluetoothPort => format!("{} (Bluetooth)", p.port_name),
            SerialPortType::PciPort => format!("{} (PCI)", p.port_name),
            SerialPortType::Unknown => p.port_name,
        })
        .collect();
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_complete_lines_only() {
        let mut framer = LineFramer::new();
        framer.push(b"42.");
        assert_eq!(framer.next_line(), None);

        framer.push(b"0\r\n71");
        assert_eq!(framer.next_line().as_deref(), Some("42.0"));
        assert_eq!(framer.next_line(), None);

        framer.push(b".5\n");
        assert_eq!(framer.next_line().as_deref(), Some("71.5"));
    }

    #[test]
    fn several_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        framer.push(b"1\n\n  2 \r\n3\n");
        let lines: Vec<String> = std::iter::from_fn(|| framer.next_line()).collect();
        assert_eq!(lines, vec!["1", "2", "3"]);
    }

    #[test]
    fn invalid_utf8_is_kept_as_garbage_line() {
        let mut framer = LineFramer::new();
        framer.push(&[0xff, 0xfe, b'\n']);
        let line = framer.next_line().unwrap();
        assert!(line.parse::<f64>().is_err());
    }

    #[test]
    fn tail_of_dropped_line_is_not_a_reading() {
        let mut framer = LineFramer::new();
        framer.push(&[b'#'; MAX_LINE_BYTES + 1]);
        framer.push(b"85\n");
        assert_eq!(framer.next_line(), None);

        // Framing resumes after the terminator
        framer.push(b"42\n");
        assert_eq!(framer.next_line().as_deref(), Some("42"));
    }

    #[test]
    fn dropped_line_spanning_several_chunks() {
        let mut framer = LineFramer::new();
        framer.push(&[b'#'; MAX_LINE_BYTES + 1]);
        framer.push(b"####");
        framer.push(b"99\n17");
        assert_eq!(framer.next_line(), None);
        framer.push(b"\n");
        assert_eq!(framer.next_line().as_deref(), Some("17"));
    }

    #[test]
    fn timeouts_and_empty_reads_are_idle() {
        assert_eq!(received(Ok(0)).unwrap(), None);
        assert_eq!(received(Ok(12)).unwrap(), Some(12));
        for kind in [io::ErrorKind::TimedOut, io::ErrorKind::WouldBlock] {
            assert_eq!(received(Err(io::Error::new(kind, "no data"))).unwrap(), None);
        }
    }

    #[test]
    fn other_read_failures_are_errors() {
        let err = received(Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn oversized_unterminated_input_is_dropped() {
        let mut framer = LineFramer::new();
        framer.push(&vec![b'9'; MAX_LINE_BYTES + 1]);
        framer.push(b"\n12\n");
        assert_eq!(framer.next_line().as_deref(), Some("12"));
    }
}
