// Scripted socket for driving the state machine through exact send/recv outcomes
use crate::traits::StreamSocket;
use sockio_core::{AddressKind, Endpoint, IoError, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

pub(crate) enum SendStep {
    /// Accept at most this many bytes.
    Accept(usize),
    WouldBlock,
    Fail(io::ErrorKind),
}

pub(crate) enum RecvStep {
    Data(Vec<u8>),
    Eof,
    WouldBlock,
    Fail(io::ErrorKind),
}

// Empty send script accepts everything; empty recv script would block.
#[derive(Default)]
pub(crate) struct Script {
    pub sends: VecDeque<SendStep>,
    pub recvs: VecDeque<RecvStep>,
    pub written: Vec<u8>,
    pub send_calls: usize,
    pub nonblocking: bool,
    pub shut_down: bool,
    pub keepalive: Option<bool>,
    pub keepalive_time: Option<u32>,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptHandle(Rc<RefCell<Script>>);

impl ScriptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn socket(&self) -> ScriptedSocket {
        ScriptedSocket {
            script: Rc::clone(&self.0),
        }
    }

    pub fn push_send(&self, step: SendStep) {
        self.0.borrow_mut().sends.push_back(step);
    }

    pub fn push_recv(&self, step: RecvStep) {
        self.0.borrow_mut().recvs.push_back(step);
    }

    pub fn written(&self) -> Vec<u8> {
        self.0.borrow().written.clone()
    }

    pub fn send_calls(&self) -> usize {
        self.0.borrow().send_calls
    }

    pub fn with<R>(&self, f: impl FnOnce(&Script) -> R) -> R {
        f(&self.0.borrow())
    }
}

pub(crate) struct ScriptedSocket {
    script: Rc<RefCell<Script>>,
}

impl StreamSocket for ScriptedSocket {
    fn connect(endpoint: &Endpoint, _kind: AddressKind) -> Result<Self> {
        Err(IoError::Connect {
            endpoint: endpoint.clone(),
            source: io::ErrorKind::ConnectionRefused.into(),
        })
    }

    fn set_nonblocking(&self) -> io::Result<()> {
        self.script.borrow_mut().nonblocking = true;
        Ok(())
    }

    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut script = self.script.borrow_mut();
        script.send_calls += 1;
        let accepted = match script.sends.pop_front() {
            None => buf.len(),
            Some(SendStep::Accept(max)) => max.min(buf.len()),
            Some(SendStep::WouldBlock) => return Err(io::ErrorKind::WouldBlock.into()),
            Some(SendStep::Fail(kind)) => return Err(kind.into()),
        };
        script.written.extend_from_slice(&buf[..accepted]);
        Ok(accepted)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut script = self.script.borrow_mut();
        match script.recvs.pop_front() {
            None | Some(RecvStep::WouldBlock) => Err(io::ErrorKind::WouldBlock.into()),
            Some(RecvStep::Eof) => Ok(0),
            Some(RecvStep::Fail(kind)) => Err(kind.into()),
            Some(RecvStep::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    script.recvs.push_front(RecvStep::Data(data[n..].to_vec()));
                }
                Ok(n)
            }
        }
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.script.borrow_mut().shut_down = true;
        Ok(())
    }

    fn set_keepalive(&self, enabled: bool) -> io::Result<()> {
        self.script.borrow_mut().keepalive = Some(enabled);
        Ok(())
    }

    fn set_keepalive_time(&self, secs: u32) -> io::Result<()> {
        self.script.borrow_mut().keepalive_time = Some(secs);
        Ok(())
    }
}
