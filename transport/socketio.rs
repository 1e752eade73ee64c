// SocketIo: one logical connection driven by a cooperative, single-threaded poll loop
use crate::pending::{PendingQueue, PendingWrite};
use crate::traits::{
    is_try_again, IoInterface, OnBytesReceived, OnCloseComplete, OnIoError, OnSendComplete,
    OpenCallbacks, StreamSocket,
};
use sockio_core::{
    AddressKind, Endpoint, IoError, IoOpenResult, IoSendResult, IoState, OptionSnapshot,
    OptionValue, Result, SocketOption, TransportSettings, OPTION_TCP_KEEPALIVE,
    OPTION_TCP_KEEPALIVE_TIME,
};
use std::fmt;
use std::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// How a transport gets its connection.
pub enum SocketIoConfig<S> {
    /// Client mode: resolve and connect at open.
    Host(Endpoint),
    /// Accepted-socket mode: the socket is already connected.
    Accepted(S),
}

impl<S> SocketIoConfig<S> {
    pub fn host(host: &str, port: u16) -> Self {
        SocketIoConfig::Host(Endpoint::new(host, port))
    }

    pub fn accepted(socket: S) -> Self {
        SocketIoConfig::Accepted(socket)
    }
}

/// Non-blocking transport over a single stream socket.
///
/// Writes the socket cannot take right away are copied into a FIFO queue
/// and flushed by [`IoInterface::drive`]; received bytes and fatal
/// conditions are surfaced through the callbacks registered at open.
pub struct SocketIo<S: StreamSocket = TcpStream> {
    socket: Option<S>,
    state: IoState,
    address_kind: AddressKind,
    endpoint: Option<Endpoint>,
    on_bytes_received: Option<OnBytesReceived>,
    on_io_error: Option<OnIoError>,
    pending: PendingQueue,
    recv_buffer: Box<[u8]>,
    options: OptionSnapshot,
}

pub type TcpSocketIo = SocketIo<TcpStream>;

impl<S: StreamSocket> SocketIo<S> {
    pub fn create(config: SocketIoConfig<S>) -> Result<Self> {
        Self::with_settings(config, &TransportSettings::default())
    }

    pub fn with_settings(config: SocketIoConfig<S>, settings: &TransportSettings) -> Result<Self> {
        let (endpoint, socket) = match config {
            SocketIoConfig::Host(endpoint) => {
                if endpoint.host.is_empty() {
                    error!("hostname is empty and no accepted socket was given");
                    return Err(IoError::InvalidArgument("hostname is empty"));
                }
                (Some(endpoint), None)
            }
            SocketIoConfig::Accepted(socket) => (None, Some(socket)),
        };

        Ok(SocketIo {
            socket,
            state: IoState::Closed,
            address_kind: AddressKind::default(),
            endpoint,
            on_bytes_received: None,
            on_io_error: None,
            pending: PendingQueue::new(),
            recv_buffer: vec![0u8; settings.recv_buffer_size.max(1)].into_boxed_slice(),
            options: OptionSnapshot::new(),
        })
    }

    pub fn address_kind(&self) -> AddressKind {
        self.address_kind
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// The underlying socket, e.g. for registering it with a readiness poller.
    pub fn socket(&self) -> Option<&S> {
        self.socket.as_ref()
    }

    /// Number of writes still waiting in the outbound queue.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    pub fn queued_bytes(&self) -> usize {
        self.pending.queued_bytes()
    }

    fn indicate_error(&mut self) {
        if let Some(on_io_error) = self.on_io_error.as_mut() {
            on_io_error();
        }
    }

    fn enter_error(&mut self) {
        self.state = IoState::Error;
        self.indicate_error();
    }

    fn open_socket(
        &mut self,
        on_bytes_received: Option<OnBytesReceived>,
        on_io_error: Option<OnIoError>,
    ) -> Result<()> {
        if self.state != IoState::Closed {
            return Err(IoError::InvalidState {
                expected: IoState::Closed,
                actual: self.state,
            });
        }

        let accepted = self.socket.is_some();
        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => {
                let endpoint = self.endpoint.as_ref().ok_or(IoError::NoEndpoint)?;
                self.state = IoState::Opening;
                match S::connect(endpoint, self.address_kind) {
                    Ok(socket) => socket,
                    Err(err) => {
                        self.state = IoState::Closed;
                        return Err(err);
                    }
                }
            }
        };

        if let Err(err) = self.prepare_socket(&socket) {
            // an accepted socket stays owned by the transport; a fresh one is released
            if accepted {
                self.socket = Some(socket);
            }
            self.state = IoState::Closed;
            return Err(err);
        }

        self.socket = Some(socket);
        self.on_bytes_received = on_bytes_received;
        self.on_io_error = on_io_error;
        self.state = IoState::Open;
        Ok(())
    }

    // Non-blocking mode plus every keepalive option recorded while closed
    fn prepare_socket(&self, socket: &S) -> Result<()> {
        socket.set_nonblocking().map_err(|source| IoError::SetOption {
            name: "O_NONBLOCK",
            source,
        })?;
        for option in self.options.iter() {
            apply_socket_option(socket, option)?;
        }
        Ok(())
    }

    // On allocation failure the completion is dropped unrun and nothing is queued
    fn enqueue(&mut self, bytes: &[u8], on_send_complete: Option<OnSendComplete>) -> Result<()> {
        let write = PendingWrite::copy_from(bytes, on_send_complete).map_err(|err| {
            error!(error = %err, "cannot queue write");
            err
        })?;
        self.pending.push(write);
        trace!(len = bytes.len(), queued = self.pending.len(), "queued write");
        Ok(())
    }

    fn flush_pending(&mut self) {
        loop {
            let Some(socket) = self.socket.as_mut() else {
                break;
            };
            let Some(head) = self.pending.front_mut() else {
                break;
            };

            match socket.send(head.remaining()) {
                Ok(sent) => {
                    head.advance(sent);
                    if !head.is_flushed() {
                        // keep byte order: the next record waits until this one is done
                        trace!(sent, remaining = head.remaining_len(), "partial flush");
                        break;
                    }
                    if let Some(mut done) = self.pending.pop_front() {
                        if let Some(on_send_complete) = done.take_completion() {
                            on_send_complete(IoSendResult::Ok);
                        }
                    }
                }
                Err(err) if is_try_again(&err) => break,
                Err(err) => {
                    error!(error = %err, queued = self.pending.len(), "sending queued data failed");
                    // the failing record is discarded without its completion
                    self.pending.pop_front();
                    self.enter_error();
                    break;
                }
            }
        }
    }

    fn receive_available(&mut self) {
        while self.state == IoState::Open {
            let Some(socket) = self.socket.as_mut() else {
                break;
            };

            match socket.recv(&mut self.recv_buffer) {
                Ok(0) => {
                    // orderly shutdown by the peer, not worth an error log
                    debug!("peer closed the connection");
                    self.enter_error();
                }
                Ok(received) => {
                    if let Some(on_bytes_received) = self.on_bytes_received.as_mut() {
                        on_bytes_received(&self.recv_buffer[..received]);
                    }
                }
                Err(err) if is_try_again(&err) => break,
                Err(err) => {
                    error!(error = %err, "receiving data from endpoint failed");
                    self.enter_error();
                }
            }
        }
    }
}

fn apply_socket_option<S: StreamSocket>(socket: &S, option: &SocketOption) -> Result<()> {
    match *option {
        SocketOption::KeepAlive(enabled) => {
            socket
                .set_keepalive(enabled)
                .map_err(|source| IoError::SetOption {
                    name: OPTION_TCP_KEEPALIVE,
                    source,
                })
        }
        SocketOption::KeepAliveTime(secs) => {
            socket
                .set_keepalive_time(secs)
                .map_err(|source| IoError::SetOption {
                    name: OPTION_TCP_KEEPALIVE_TIME,
                    source,
                })
        }
        SocketOption::AddressKind(_) => Ok(()),
    }
}

impl<S: StreamSocket> IoInterface for SocketIo<S> {
    fn retrieve_options(&self) -> OptionSnapshot {
        self.options.clone()
    }

    fn open(&mut self, callbacks: OpenCallbacks) -> Result<()> {
        let OpenCallbacks {
            on_open_complete,
            on_bytes_received,
            on_io_error,
        } = callbacks;

        let result = self.open_socket(on_bytes_received, on_io_error);
        match &result {
            Ok(()) => match &self.endpoint {
                Some(endpoint) => info!(%endpoint, "transport open"),
                None => info!("accepted transport open"),
            },
            Err(err) => error!(error = %err, state = %self.state, "open failed"),
        }

        if let Some(on_open_complete) = on_open_complete {
            on_open_complete(if result.is_ok() {
                IoOpenResult::Ok
            } else {
                IoOpenResult::Error
            });
        }

        result
    }

    fn close(&mut self, on_close_complete: Option<OnCloseComplete>) {
        if !matches!(self.state, IoState::Closed | IoState::Closing) {
            self.state = IoState::Closing;
            if let Some(mut socket) = self.socket.take() {
                // nothing to recover if shutdown fails; the descriptor is released either way
                if let Err(err) = socket.shutdown() {
                    debug!(error = %err, "shutdown failed");
                }
            }
            let dropped = self.pending.clear();
            if dropped > 0 {
                warn!(dropped, "closing with unsent writes");
            }
            self.on_bytes_received = None;
            self.on_io_error = None;
            self.state = IoState::Closed;
            info!("transport closed");
        }

        if let Some(on_close_complete) = on_close_complete {
            on_close_complete();
        }
    }

    fn send(&mut self, bytes: &[u8], on_send_complete: Option<OnSendComplete>) -> Result<()> {
        if bytes.is_empty() {
            error!("send given an empty buffer");
            return Err(IoError::InvalidArgument("send buffer is empty"));
        }
        if self.state != IoState::Open {
            error!(state = %self.state, "send on a transport that is not open");
            return Err(IoError::InvalidState {
                expected: IoState::Open,
                actual: self.state,
            });
        }

        if !self.pending.is_empty() {
            return self.enqueue(bytes, on_send_complete);
        }

        let Some(socket) = self.socket.as_mut() else {
            return Err(IoError::InvalidState {
                expected: IoState::Open,
                actual: self.state,
            });
        };

        match socket.send(bytes) {
            Ok(sent) if sent == bytes.len() => {
                if let Some(on_send_complete) = on_send_complete {
                    on_send_complete(IoSendResult::Ok);
                }
                Ok(())
            }
            Ok(sent) => self.enqueue(&bytes[sent..], on_send_complete),
            // socket buffer full: keep the whole buffer for the next drive step
            Err(err) if is_try_again(&err) => self.enqueue(bytes, on_send_complete),
            Err(err) => {
                error!(error = %err, "sending on socket failed");
                Err(IoError::Send(err))
            }
        }
    }

    fn drive(&mut self) {
        if self.state != IoState::Open {
            return;
        }
        self.flush_pending();
        self.receive_available();
    }

    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()> {
        let option = SocketOption::parse(name, &value).map_err(|err| {
            error!(error = %err, "option rejected");
            err
        })?;

        match option {
            SocketOption::AddressKind(kind) => {
                if self.state != IoState::Closed {
                    error!(state = %self.state, "address kind can only change while closed");
                    return Err(IoError::InvalidState {
                        expected: IoState::Closed,
                        actual: self.state,
                    });
                }
                self.address_kind = kind;
            }
            _ => {
                if let Some(socket) = self.socket.as_ref() {
                    apply_socket_option(socket, &option)?;
                }
            }
        }

        self.options.record(option);
        Ok(())
    }

    fn state(&self) -> IoState {
        self.state
    }
}

impl<S: StreamSocket> Drop for SocketIo<S> {
    fn drop(&mut self) {
        let dropped = self.pending.clear();
        if dropped > 0 {
            debug!(dropped, "destroying transport with pending writes");
        }
    }
}

impl<S: StreamSocket> fmt::Debug for SocketIo<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SocketIo")
            .field("state", &self.state)
            .field("address_kind", &self.address_kind)
            .field("endpoint", &self.endpoint)
            .field("has_socket", &self.socket.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}
