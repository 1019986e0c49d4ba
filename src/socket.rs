//! Raw blocking AF_KEY socket.

use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::trace;

use crate::error::Result;
use crate::types::PF_KEY_V2;

/// The key-management socket domain on Linux.
const AF_KEY: i32 = 15;

/// Receive buffer size. 8 KiB is sufficient for any PF_KEY message.
pub const RECV_BUF_LEN: usize = 8192;

/// Byte-level transport carrying PF_KEY datagrams.
///
/// Each `send` writes one complete message in a single call and each `recv`
/// reads one complete message in a single call. [`KeySocket`] is the kernel
/// implementation; tests substitute scripted transports.
pub trait Transport {
    /// Write one datagram. Returns the number of bytes written.
    fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Read one datagram into `buf`. Returns the number of bytes read.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// A blocking PF_KEY v2 kernel socket.
///
/// The descriptor is closed on drop. Opening requires `CAP_NET_ADMIN`.
/// The socket must not be shared between sessions; concurrent use is
/// undefined at the protocol level.
pub struct KeySocket {
    socket: Socket,
}

impl KeySocket {
    /// Open a raw key-management socket.
    pub fn new() -> Result<Self> {
        let socket = Socket::new(
            Domain::from(AF_KEY),
            Type::RAW,
            Some(Protocol::from(i32::from(PF_KEY_V2))),
        )?;
        Ok(Self { socket })
    }
}

impl Transport for KeySocket {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.socket.write(buf)?;
        trace!(bytes = n, "sent PF_KEY datagram");
        Ok(n)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.socket.read(buf)?;
        trace!(bytes = n, "received PF_KEY datagram");
        Ok(n)
    }
}

impl AsRawFd for KeySocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}
