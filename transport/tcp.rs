// TCP socket implementation: IPv4 resolve + blocking connect, then non-blocking I/O
use crate::traits::StreamSocket;
use nix::sys::socket::{
    connect, setsockopt, socket, sockopt, AddressFamily, SockFlag, SockType, SockaddrIn,
};
use sockio_core::{AddressKind, Endpoint, IoError, Result};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, SocketAddrV4, TcpStream, ToSocketAddrs};
use std::os::unix::io::AsRawFd;
use tracing::{debug, trace};

/// Resolves `endpoint` and returns the first IPv4 address.
pub fn resolve_ipv4(endpoint: &Endpoint) -> Result<SocketAddrV4> {
    let addrs = (endpoint.host.as_str(), endpoint.port)
        .to_socket_addrs()
        .map_err(|source| IoError::Resolve {
            endpoint: endpoint.clone(),
            source,
        })?;

    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| IoError::NoAddress(endpoint.clone()))
}

impl StreamSocket for TcpStream {
    fn connect(endpoint: &Endpoint, kind: AddressKind) -> Result<Self> {
        let fd = socket(AddressFamily::Inet, SockType::Stream, SockFlag::empty(), None)
            .map_err(|errno| IoError::SocketCreate(errno.into()))?;

        if kind != AddressKind::Ip {
            return Err(IoError::UnsupportedAddressKind(kind));
        }

        let addr = resolve_ipv4(endpoint)?;
        trace!(%endpoint, %addr, "resolved endpoint");

        connect(fd.as_raw_fd(), &SockaddrIn::from(addr)).map_err(|errno| IoError::Connect {
            endpoint: endpoint.clone(),
            source: errno.into(),
        })?;
        debug!(%endpoint, %addr, "connected");

        Ok(TcpStream::from(fd))
    }

    fn set_nonblocking(&self) -> io::Result<()> {
        TcpStream::set_nonblocking(self, true)
    }

    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write(buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }

    fn set_keepalive(&self, enabled: bool) -> io::Result<()> {
        setsockopt(self, sockopt::KeepAlive, &enabled).map_err(io::Error::from)
    }

    fn set_keepalive_time(&self, secs: u32) -> io::Result<()> {
        keepalive_idle(self, secs)
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn keepalive_idle(stream: &TcpStream, secs: u32) -> io::Result<()> {
    setsockopt(stream, sockopt::TcpKeepIdle, &secs).map_err(io::Error::from)
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn keepalive_idle(stream: &TcpStream, secs: u32) -> io::Result<()> {
    setsockopt(stream, sockopt::TcpKeepAlive, &secs).map_err(io::Error::from)
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
fn keepalive_idle(_stream: &TcpStream, _secs: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "keepalive idle time is not supported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn resolves_localhost_to_ipv4() {
        let addr = resolve_ipv4(&Endpoint::new("127.0.0.1", 8080)).unwrap();
        assert_eq!(addr, "127.0.0.1:8080".parse::<SocketAddrV4>().unwrap());
    }

    #[test]
    fn ipv6_only_literal_has_no_ipv4_address() {
        assert!(matches!(
            resolve_ipv4(&Endpoint::new("::1", 80)),
            Err(IoError::NoAddress(_))
        ));
    }

    #[test]
    fn keepalive_options_reach_the_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let stream =
            <TcpStream as StreamSocket>::connect(&Endpoint::new("127.0.0.1", port), AddressKind::Ip)
                .unwrap();

        stream.set_keepalive(true).unwrap();
        assert!(nix::sys::socket::getsockopt(&stream, sockopt::KeepAlive).unwrap());
        stream.set_keepalive(false).unwrap();
        assert!(!nix::sys::socket::getsockopt(&stream, sockopt::KeepAlive).unwrap());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn keepalive_time_sets_idle_interval() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let stream =
            <TcpStream as StreamSocket>::connect(&Endpoint::new("127.0.0.1", port), AddressKind::Ip)
                .unwrap();

        stream.set_keepalive_time(42).unwrap();
        assert_eq!(nix::sys::socket::getsockopt(&stream, sockopt::TcpKeepIdle).unwrap(), 42);
    }
}
