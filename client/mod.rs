// client: request/response client library on top of a driven sockio transport
use chrono::{DateTime, Local};
use sockio::{IoInterface, OpenCallbacks, Result, SocketIoConfig, TcpSocketIo};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

pub struct SockioClient {
    transport: TcpSocketIo,
    inbox: Rc<RefCell<Vec<u8>>>,
    peer_closed: Rc<Cell<bool>>,
    completed_sends: Rc<Cell<usize>>,
}

impl SockioClient {
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let mut transport = sockio::create_socketio(SocketIoConfig::host(host, port))?;
        let inbox = Rc::new(RefCell::new(Vec::new()));
        let peer_closed = Rc::new(Cell::new(false));

        let sink = Rc::clone(&inbox);
        let closed = Rc::clone(&peer_closed);
        transport.open(
            OpenCallbacks::new()
                .on_bytes_received(move |bytes| sink.borrow_mut().extend_from_slice(bytes))
                .on_io_error(move || closed.set(true)),
        )?;

        Ok(SockioClient {
            transport,
            inbox,
            peer_closed,
            completed_sends: Rc::new(Cell::new(0)),
        })
    }

    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        let completed = Rc::clone(&self.completed_sends);
        self.transport.send(
            data,
            Some(Box::new(move |_| completed.set(completed.get() + 1))),
        )
    }

    /// Runs one drive step and hands back whatever arrived during it.
    pub fn poll(&mut self) -> Vec<u8> {
        self.transport.drive();
        std::mem::take(&mut *self.inbox.borrow_mut())
    }

    /// Polls until the peer closes or nothing arrives for `idle`.
    pub fn receive_until_closed(&mut self, idle: Duration) -> Vec<u8> {
        let mut response = Vec::new();
        let mut last_activity = Instant::now();

        while !self.is_closed() {
            let chunk = self.poll();
            if chunk.is_empty() {
                if last_activity.elapsed() >= idle {
                    warn!(?idle, "gave up waiting for the peer");
                    break;
                }
                thread::sleep(POLL_INTERVAL);
            } else {
                debug!(len = chunk.len(), "received chunk");
                response.extend_from_slice(&chunk);
                last_activity = Instant::now();
            }
        }

        response
    }

    /// True once the peer shut down or the connection failed.
    pub fn is_closed(&self) -> bool {
        self.peer_closed.get()
    }

    pub fn completed_sends(&self) -> usize {
        self.completed_sends.get()
    }

    pub fn pending_writes(&self) -> usize {
        self.transport.pending_writes()
    }

    pub fn close(mut self) {
        self.transport.close(None);
    }
}

/// One output line per received chunk: local time, size and lossy text.
pub fn format_chunk(bytes: &[u8], at: DateTime<Local>) -> String {
    let text = String::from_utf8_lossy(bytes);
    format!(
        "{} [{:6} bytes] {}",
        at.format("%Y/%m/%d %H:%M:%S%.6f"),
        bytes.len(),
        text.trim_end()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    #[test]
    fn client_collects_response_until_peer_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 64];
            let n = stream.read(&mut buf).unwrap();
            stream.write_all(b"pong:").unwrap();
            stream.write_all(&buf[..n]).unwrap();
        });

        let mut client = SockioClient::connect("127.0.0.1", port).unwrap();
        client.send(b"ping").unwrap();
        assert_eq!(client.completed_sends(), 1);

        let response = client.receive_until_closed(Duration::from_secs(10));
        server.join().unwrap();

        assert_eq!(response, b"pong:ping");
        assert!(client.is_closed());
        assert_eq!(client.pending_writes(), 0);
        client.close();
    }

    #[test]
    fn connect_failure_is_reported() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(SockioClient::connect("127.0.0.1", port).is_err());
    }

    #[test]
    fn chunk_line_has_timestamp_size_and_text() {
        let at = Local.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap();
        let line = format_chunk(b"HTTP/1.0 200 OK\r\n", at);
        assert_eq!(line, "2026/10/17 09:30:00.000000 [    17 bytes] HTTP/1.0 200 OK");
    }
}
