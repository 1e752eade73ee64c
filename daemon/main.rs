// sockio-echo: single-threaded echo server, one accepted-socket transport per client
use sockio::{IoInterface, IoState, OpenCallbacks, SocketIoConfig, TcpSocketIo};
use std::cell::{Cell, RefCell};
use std::env;
use std::io::ErrorKind;
use std::net::TcpListener;
use std::process;
use std::rc::Rc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

const DEFAULT_ECHO_ADDR: &str = "127.0.0.1:7878";
const IDLE_SLEEP: Duration = Duration::from_millis(1);

struct Session {
    id: u64,
    transport: TcpSocketIo,
    inbox: Rc<RefCell<Vec<u8>>>,
    failed: Rc<Cell<bool>>,
}

impl Session {
    fn open(id: u64, mut transport: TcpSocketIo) -> sockio::Result<Self> {
        let inbox = Rc::new(RefCell::new(Vec::new()));
        let failed = Rc::new(Cell::new(false));

        let sink = Rc::clone(&inbox);
        let flag = Rc::clone(&failed);
        transport.open(
            OpenCallbacks::new()
                .on_bytes_received(move |bytes| sink.borrow_mut().extend_from_slice(bytes))
                .on_io_error(move || flag.set(true)),
        )?;

        Ok(Session {
            id,
            transport,
            inbox,
            failed,
        })
    }

    // Drive once and echo what arrived; false when the session is finished
    fn step(&mut self) -> bool {
        self.transport.drive();

        let data = std::mem::take(&mut *self.inbox.borrow_mut());
        if !data.is_empty() && self.transport.state() == IoState::Open {
            if let Err(e) = self.transport.send(&data, None) {
                warn!(id = self.id, error = %e, "echo failed");
                return false;
            }
        }

        !self.failed.get()
    }
}

fn main() {
    sockio::init_logging();

    let addr = env::var("SOCKIO_ECHO_ADDR").unwrap_or_else(|_| DEFAULT_ECHO_ADDR.to_string());
    let listener = match TcpListener::bind(&addr) {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "bind failed");
            process::exit(1);
        }
    };
    if let Err(e) = listener.set_nonblocking(true) {
        error!(error = %e, "cannot make listener non-blocking");
        process::exit(1);
    }
    info!(%addr, "echo server listening");

    let mut sessions: Vec<Session> = Vec::new();
    let mut next_id = 0u64;

    loop {
        let mut busy = false;

        match listener.accept() {
            Ok((stream, peer)) => {
                busy = true;
                next_id += 1;
                let opened = sockio::create_socketio(SocketIoConfig::accepted(stream))
                    .and_then(|transport| Session::open(next_id, transport));
                match opened {
                    Ok(session) => {
                        info!(id = next_id, %peer, "client connected");
                        sessions.push(session);
                    }
                    Err(e) => warn!(%peer, error = %e, "cannot serve client"),
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => warn!(error = %e, "accept failed"),
        }

        sessions.retain_mut(|session| {
            let pending_before = session.transport.pending_writes();
            let alive = session.step();
            busy |= pending_before > 0 || session.transport.pending_writes() > 0;
            if !alive {
                session.transport.close(None);
                info!(id = session.id, "client disconnected");
            }
            alive
        });

        if !busy {
            thread::sleep(IDLE_SLEEP);
        }
    }
}
