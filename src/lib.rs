//! Blocking PF_KEY v2 (RFC 2367) client for Linux.
//!
//! PF_KEY is the key-management socket through which user space administers
//! the kernel's IPsec Security Association database. This crate implements
//! the message codec (base header + ordered extension TLVs, byte-exact
//! against the kernel's layout) and a small synchronous session on top of a
//! raw `AF_KEY` socket: REGISTER, GETSPI, ADD, UPDATE, DELETE, FLUSH and the
//! multi-reply DUMP stream.
//!
//! # Example
//!
//! ```ignore
//! use pfkey::{Session, build};
//!
//! let mut session = Session::open()?;
//! session.send(&mut build::register())?;
//! let sas = session.dump()?;
//! for sa in &sas {
//!     println!("{}", sa);
//! }
//! ```
//!
//! The codec never requires an async runtime; all I/O is one blocking
//! read or write per message. Callers wanting deadlines should set socket
//! timeouts on the underlying fd.

pub mod build;
mod error;
pub mod ext;
pub mod message;
mod parse;
pub mod session;
pub mod socket;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{Error, Result};
pub use ext::Extension;
pub use message::Message;
pub use session::{DumpError, Registration, Session};
pub use socket::{KeySocket, Transport};
pub use types::{Endpoint, MsgType, SadbAlg, SadbLifetime, SadbSa};
