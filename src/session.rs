//! A blocking PF_KEY session: one socket, synchronous request/reply.

use std::io;

use tracing::debug;

use crate::build;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::socket::{KeySocket, RECV_BUF_LEN, Transport};
use crate::types::{Endpoint, SadbAlg};

/// The algorithm tables a REGISTER reply announces.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    /// Authentication algorithms the kernel supports.
    pub auth_algorithms: Vec<SadbAlg>,
    /// Encryption algorithms the kernel supports.
    pub encrypt_algorithms: Vec<SadbAlg>,
}

/// A DUMP that terminated abnormally. The messages collected before the
/// failure are preserved; callers decide whether to use them.
#[derive(Debug, thiserror::Error)]
#[error("DUMP aborted after {} messages: {source}", .partial.len())]
pub struct DumpError {
    /// Replies collected before the error.
    pub partial: Vec<Message>,
    /// The terminating error.
    #[source]
    pub source: Error,
}

/// A synchronous PF_KEY session owning one kernel socket.
///
/// A session serializes its own sends and receives; the socket must not be
/// shared with other sessions. Sessions are cheap to construct and discard.
/// There are no timeouts or retries here: callers wanting a deadline set
/// socket options on the fd.
pub struct Session<T: Transport = KeySocket> {
    transport: T,
}

impl Session<KeySocket> {
    /// Open a session on a fresh AF_KEY socket.
    pub fn open() -> Result<Self> {
        Ok(Self {
            transport: KeySocket::new()?,
        })
    }
}

impl<T: Transport> Session<T> {
    /// Run a session over an arbitrary transport.
    pub fn from_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Send one message. The message's length field is computed from its
    /// extensions before the write; the whole message goes out in a single
    /// write call.
    pub fn send(&mut self, msg: &mut Message) -> Result<()> {
        let bytes = msg.to_bytes()?;
        debug!(msg_type = msg.header.sadb_msg_type, len = bytes.len(), "sending");
        let n = self.transport.send(&bytes)?;
        if n != bytes.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", n, bytes.len()),
            )
            .into());
        }
        Ok(())
    }

    /// Receive and parse one message.
    pub fn recv(&mut self) -> Result<Message> {
        let mut buf = [0u8; RECV_BUF_LEN];
        let n = self.transport.recv(&mut buf)?;
        if n == 0 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        debug!(bytes = n, "received");
        Message::from_bytes(&buf[..n])
    }

    /// Send SADB_REGISTER.
    pub fn send_register(&mut self) -> Result<()> {
        self.send(&mut build::register())
    }

    /// Send SADB_FLUSH.
    pub fn send_flush(&mut self) -> Result<()> {
        self.send(&mut build::flush())
    }

    /// Send SADB_DUMP.
    pub fn send_dump(&mut self) -> Result<()> {
        self.send(&mut build::dump())
    }

    /// Send SADB_GETSPI for an association between `src` and `dst`.
    pub fn send_getspi(&mut self, seq: u32, src: Endpoint, dst: Endpoint) -> Result<()> {
        self.send(&mut build::getspi(seq, src, dst))
    }

    /// Register as the key manager for ESP and return the kernel's
    /// supported algorithm tables.
    pub fn register(&mut self) -> Result<Registration> {
        self.send_register()?;
        let reply = self.recv()?;
        let errno = reply.header.sadb_msg_errno as i32;
        if errno != 0 {
            return Err(Error::from_errno(errno));
        }
        Ok(Registration {
            auth_algorithms: reply.supported_auth().unwrap_or_default().to_vec(),
            encrypt_algorithms: reply.supported_encrypt().unwrap_or_default().to_vec(),
        })
    }

    /// Enumerate the kernel's SA database.
    ///
    /// Sends SADB_DUMP and collects the reply stream. The kernel delimits
    /// the stream by sequence number: every reply carries a decreasing
    /// counter and the final reply carries `seq == 0`, so the terminator is
    /// part of the result set (it holds the last real record). An empty
    /// database answers with a single ENOENT reply and yields an empty
    /// list.
    ///
    /// Replies are not filtered by type or originating pid; a concurrent
    /// DUMP from another process can interleave. Keep the socket private to
    /// one session.
    pub fn dump(&mut self) -> std::result::Result<Vec<Message>, DumpError> {
        if let Err(e) = self.send_dump() {
            return Err(DumpError {
                partial: Vec::new(),
                source: e,
            });
        }
        self.collect_dump()
    }

    /// The DUMP reply state machine: awaiting the first reply, collecting,
    /// done on the seq-0 terminator or an ENOENT header.
    fn collect_dump(&mut self) -> std::result::Result<Vec<Message>, DumpError> {
        let mut messages = Vec::new();

        loop {
            let msg = match self.recv() {
                Ok(msg) => msg,
                Err(e) => {
                    return Err(DumpError {
                        partial: messages,
                        source: e,
                    });
                }
            };

            let errno = msg.header.sadb_msg_errno as i32;
            if errno != 0 {
                let err = Error::from_errno(errno);
                if err.is_not_found() {
                    // Benign terminator; an empty database answers with this.
                    return Ok(messages);
                }
                return Err(DumpError {
                    partial: messages,
                    source: err,
                });
            }

            let last = msg.header.sadb_msg_seq == 0;
            messages.push(msg);
            if last {
                return Ok(messages);
            }
        }
    }
}
