//! Wire parser for PF_KEY messages.
//!
//! One socket read delivers one datagram. The parser decodes the base
//! header, validates version and declared length, then walks the extension
//! TLVs: peek the 4-byte (len, type) prefix, dispatch on the type, let the
//! extension decoder consume its record and any trailing payload it owns,
//! and repeat until the declared message end.

use tracing::warn;
use zerocopy::FromBytes;

use crate::error::{Error, Result};
use crate::ext::Extension;
use crate::message::Message;
use crate::types::{
    PF_KEY_V2, SadbAddress, SadbAlg, SadbComb, SadbKey, SadbLifetime, SadbMsg, SadbProp, SadbSa,
    SadbSpirange, SadbSupported, SadbXPolicy, SockAddrIn, WORD, ext_type,
};

pub(crate) fn parse_message(data: &[u8]) -> Result<Message> {
    let header = take_struct::<SadbMsg>(&mut &data[..]).map_err(|_| Error::Truncated {
        expected: SadbMsg::SIZE,
        actual: data.len(),
    })?;

    if header.sadb_msg_version != PF_KEY_V2 {
        return Err(Error::InvalidMessage(format!(
            "unsupported PF_KEY version {}",
            header.sadb_msg_version
        )));
    }

    let declared = header.sadb_msg_len as usize * WORD;
    if declared < SadbMsg::SIZE {
        return Err(Error::InvalidMessage(format!(
            "message length {} words is smaller than the base header",
            header.sadb_msg_len
        )));
    }
    if declared > data.len() {
        return Err(Error::TruncatedMessage {
            declared,
            actual: data.len(),
        });
    }

    let mut msg = Message::default();
    msg.header = header;

    // The buffer may be longer than the message; stop at the declared end.
    let mut rest = &data[SadbMsg::SIZE..declared];
    while !rest.is_empty() {
        let ext = parse_extension(&mut rest)?;
        msg.put(ext);
    }

    Ok(msg)
}

/// Decode one extension, advancing `rest` past everything it owns.
fn parse_extension(rest: &mut &[u8]) -> Result<Extension> {
    // Peek (word_len, ext_type) without consuming; each record decoder
    // re-reads them as the leading fields of its struct.
    if rest.len() < 4 {
        return Err(Error::Truncated {
            expected: 4,
            actual: rest.len(),
        });
    }
    let word_len = u16::from_ne_bytes([rest[0], rest[1]]);
    let ty = u16::from_ne_bytes([rest[2], rest[3]]);

    if word_len == 0 {
        return Err(Error::MalformedExtension(format!(
            "extension type {ty} declares zero length"
        )));
    }

    match ty {
        ext_type::SA => Ok(Extension::Sa(take_record::<SadbSa>(rest, ty, word_len)?)),
        ext_type::LIFETIME_CURRENT => Ok(Extension::LifetimeCurrent(take_record::<SadbLifetime>(
            rest, ty, word_len,
        )?)),
        ext_type::LIFETIME_HARD => Ok(Extension::LifetimeHard(take_record::<SadbLifetime>(
            rest, ty, word_len,
        )?)),
        ext_type::LIFETIME_SOFT => Ok(Extension::LifetimeSoft(take_record::<SadbLifetime>(
            rest, ty, word_len,
        )?)),
        ext_type::ADDRESS_SRC => {
            let (addr, sockaddr) = parse_address(rest, ty, word_len)?;
            Ok(Extension::AddressSrc { addr, sockaddr })
        }
        ext_type::ADDRESS_DST => {
            let (addr, sockaddr) = parse_address(rest, ty, word_len)?;
            Ok(Extension::AddressDst { addr, sockaddr })
        }
        ext_type::KEY_AUTH => {
            let (key, material) = parse_key(rest, ty, word_len)?;
            Ok(Extension::AuthKey { key, material })
        }
        ext_type::KEY_ENCRYPT => {
            let (key, material) = parse_key(rest, ty, word_len)?;
            Ok(Extension::EncryptKey { key, material })
        }
        ext_type::SPIRANGE => Ok(Extension::SpiRange(take_record::<SadbSpirange>(
            rest, ty, word_len,
        )?)),
        ext_type::PROPOSAL => {
            let prop =
                take_struct::<SadbProp>(rest).map_err(|_| Error::TruncatedExtension { ext_type: ty })?;
            // The proposal header counts one word-block; each following
            // transform combination counts one more.
            let mut combs = Vec::with_capacity(word_len as usize - 1);
            for _ in 1..word_len {
                combs.push(
                    take_struct::<SadbComb>(rest)
                        .map_err(|_| Error::TruncatedExtension { ext_type: ty })?,
                );
            }
            Ok(Extension::Proposal { prop, combs })
        }
        ext_type::SUPPORTED_AUTH => {
            let (supported, algs) = parse_supported(rest, ty, word_len)?;
            Ok(Extension::SupportedAuth { supported, algs })
        }
        ext_type::SUPPORTED_ENCRYPT => {
            let (supported, algs) = parse_supported(rest, ty, word_len)?;
            Ok(Extension::SupportedEncrypt { supported, algs })
        }
        ext_type::X_POLICY => Ok(Extension::XPolicy(take_record::<SadbXPolicy>(
            rest, ty, word_len,
        )?)),
        ext_type::ADDRESS_PROXY | ext_type::X_KMPRIVATE | ext_type::X_SA2 => {
            warn!(ext_type = ty, words = word_len, "carrying extension through uninterpreted");
            let data = take(rest, word_len as usize * WORD, ty)?.to_vec();
            Ok(Extension::Opaque { ext_type: ty, data })
        }
        _ => Err(Error::UnknownExtension { ext_type: ty }),
    }
}

/// An ADDRESS extension: the fixed header plus the sockaddr_in that follows
/// it in the same word stream.
fn parse_address(rest: &mut &[u8], ty: u16, word_len: u16) -> Result<(SadbAddress, SockAddrIn)> {
    if word_len != SadbAddress::WORDS + SockAddrIn::WORDS {
        return Err(Error::MalformedExtension(format!(
            "address extension {ty} declares {word_len} words"
        )));
    }
    let addr =
        take_struct::<SadbAddress>(rest).map_err(|_| Error::TruncatedExtension { ext_type: ty })?;
    let sockaddr =
        take_struct::<SockAddrIn>(rest).map_err(|_| Error::TruncatedExtension { ext_type: ty })?;
    if !sockaddr.is_inet() {
        return Err(Error::MalformedExtension(format!(
            "unsupported sockaddr family {}",
            sockaddr.sin_family
        )));
    }
    Ok((addr, sockaddr))
}

/// A KEY extension: the fixed header, then `(bits + 7) / 8` bytes of key
/// material padded out to the declared word length.
fn parse_key(rest: &mut &[u8], ty: u16, word_len: u16) -> Result<(SadbKey, Vec<u8>)> {
    let key = take_struct::<SadbKey>(rest).map_err(|_| Error::TruncatedExtension { ext_type: ty })?;
    let trailing = (word_len as usize * WORD).saturating_sub(SadbKey::SIZE);
    let payload = take(rest, trailing, ty)?;
    let key_bytes = key.key_bytes();
    if key_bytes > payload.len() {
        return Err(Error::TruncatedExtension { ext_type: ty });
    }
    Ok((key, payload[..key_bytes].to_vec()))
}

/// A SUPPORTED extension: the header counts one word-block, then
/// `word_len - 1` one-word algorithm records.
fn parse_supported(rest: &mut &[u8], ty: u16, word_len: u16) -> Result<(SadbSupported, Vec<SadbAlg>)> {
    let supported =
        take_struct::<SadbSupported>(rest).map_err(|_| Error::TruncatedExtension { ext_type: ty })?;
    let mut algs = Vec::with_capacity(word_len as usize - 1);
    for _ in 1..word_len {
        algs.push(
            take_struct::<SadbAlg>(rest).map_err(|_| Error::TruncatedExtension { ext_type: ty })?,
        );
    }
    Ok((supported, algs))
}

/// Read a fixed-size record whose declared word length must match its
/// struct size exactly.
fn take_record<T: FromBytes>(rest: &mut &[u8], ty: u16, word_len: u16) -> Result<T> {
    if word_len as usize * WORD != std::mem::size_of::<T>() {
        return Err(Error::MalformedExtension(format!(
            "extension type {ty} declares {word_len} words"
        )));
    }
    take_struct::<T>(rest).map_err(|_| Error::TruncatedExtension { ext_type: ty })
}

fn take<'a>(rest: &mut &'a [u8], n: usize, ty: u16) -> Result<&'a [u8]> {
    if rest.len() < n {
        return Err(Error::TruncatedExtension { ext_type: ty });
    }
    let (head, tail) = rest.split_at(n);
    *rest = tail;
    Ok(head)
}

fn take_struct<T: FromBytes>(rest: &mut &[u8]) -> std::result::Result<T, ()> {
    let size = std::mem::size_of::<T>();
    if rest.len() < size {
        return Err(());
    }
    let (head, tail) = rest.split_at(size);
    *rest = tail;
    T::read_from_bytes(head).map_err(|_| ())
}
