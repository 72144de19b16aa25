pub mod app;
pub mod canvas;
pub mod cli;
pub mod config;
pub mod layout;
pub mod metrics;
pub mod proto;
pub mod render;
pub mod transport;
pub mod widget;

/// Display geometry for the Turing 3.5" panel. Fixed by hardware.
pub const DISPLAY_WIDTH: u16 = 320;
pub const DISPLAY_HEIGHT: u16 = 480;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Serial channel never opened or already closed.
    NotConnected,
    /// Write/flush failure from the underlying transport.
    Io(std::io::Error),
    /// A write exceeded the configured serial timeout.
    Timeout,
    /// Malformed configuration, layout, or widget descriptor.
    Config(String),
    /// Bad command-line usage.
    InvalidArgs(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotConnected => write!(f, "display not connected"),
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Timeout => write!(f, "serial write timed out"),
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::InvalidArgs(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        if value.kind() == std::io::ErrorKind::TimedOut {
            Error::Timeout
        } else {
            Error::Io(value)
        }
    }
}
