// Transport abstraction: every transport variant (plain, TLS-wrapped) exposes the same surface
use sockio_core::{
    AddressKind, Endpoint, IoOpenResult, IoSendResult, IoState, OptionSnapshot, OptionValue,
    Result,
};
use std::io;

pub type OnOpenComplete = Box<dyn FnOnce(IoOpenResult)>;
pub type OnCloseComplete = Box<dyn FnOnce()>;
pub type OnSendComplete = Box<dyn FnOnce(IoSendResult)>;
pub type OnBytesReceived = Box<dyn FnMut(&[u8])>;
pub type OnIoError = Box<dyn FnMut()>;

/// Callbacks registered by `open`.
///
/// `on_bytes_received` and `on_io_error` stay registered until `close`.
#[derive(Default)]
pub struct OpenCallbacks {
    pub on_open_complete: Option<OnOpenComplete>,
    pub on_bytes_received: Option<OnBytesReceived>,
    pub on_io_error: Option<OnIoError>,
}

impl OpenCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open_complete(mut self, f: impl FnOnce(IoOpenResult) + 'static) -> Self {
        self.on_open_complete = Some(Box::new(f));
        self
    }

    pub fn on_bytes_received(mut self, f: impl FnMut(&[u8]) + 'static) -> Self {
        self.on_bytes_received = Some(Box::new(f));
        self
    }

    pub fn on_io_error(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_io_error = Some(Box::new(f));
        self
    }
}

/// The operation table a caller's I/O framework drives.
///
/// Lifecycle: create -> `open` -> repeated `drive` -> `close` -> `destroy`.
/// Implementations are single-threaded and never block outside `open`.
pub trait IoInterface {
    fn retrieve_options(&self) -> OptionSnapshot;

    /// Starts the connection. The open-complete callback fires exactly once,
    /// before this returns, whether or not the call succeeds.
    fn open(&mut self, callbacks: OpenCallbacks) -> Result<()>;

    /// Releases the connection. Never fails; the close-complete callback
    /// always fires.
    fn close(&mut self, on_close_complete: Option<OnCloseComplete>);

    fn send(&mut self, bytes: &[u8], on_send_complete: Option<OnSendComplete>) -> Result<()>;

    /// One non-blocking pass: flush queued writes, then read what is available.
    fn drive(&mut self);

    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()>;

    fn state(&self) -> IoState;

    /// Replays a snapshot taken from another instance.
    fn restore_options(&mut self, snapshot: &OptionSnapshot) -> Result<()> {
        for option in snapshot.iter() {
            self.set_option(option.name(), option.value())?;
        }
        Ok(())
    }

    fn destroy(self)
    where
        Self: Sized,
    {
        drop(self)
    }
}

/// Byte-stream socket operations the state machine relies on.
///
/// `send` and `recv` are expected to run in non-blocking mode once
/// `set_nonblocking` has been called, reporting `WouldBlock` when no
/// progress is possible.
pub trait StreamSocket: Sized {
    /// Creates a socket and connects it to `endpoint`. Blocking.
    fn connect(endpoint: &Endpoint, kind: AddressKind) -> Result<Self>;

    fn set_nonblocking(&self) -> io::Result<()>;

    fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Shuts down both directions.
    fn shutdown(&mut self) -> io::Result<()>;

    fn set_keepalive(&self, enabled: bool) -> io::Result<()>;

    fn set_keepalive_time(&self, secs: u32) -> io::Result<()>;
}

/// True for errors that only mean "no progress possible right now".
pub fn is_try_again(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
