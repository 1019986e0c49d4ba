//! The PF_KEY extension sum type.
//!
//! Every extension a message can carry is one variant here. A message holds
//! at most one extension per type; presence is membership. The serializer
//! always emits extensions in the canonical order the kernel expects,
//! regardless of the order they were set.

use zerocopy::IntoBytes;

use crate::error::{Error, Result};
use crate::types::{
    SadbAddress, SadbAlg, SadbComb, SadbKey, SadbLifetime, SadbProp, SadbSa, SadbSpirange,
    SadbSupported, SadbXPolicy, SockAddrIn, WORD, ext_type,
};

/// One extension TLV of a PF_KEY message.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    Sa(SadbSa),
    LifetimeCurrent(SadbLifetime),
    LifetimeHard(SadbLifetime),
    LifetimeSoft(SadbLifetime),
    /// Source address header plus the sockaddr_in that follows it.
    AddressSrc {
        addr: SadbAddress,
        sockaddr: SockAddrIn,
    },
    /// Destination address header plus the sockaddr_in that follows it.
    AddressDst {
        addr: SadbAddress,
        sockaddr: SockAddrIn,
    },
    /// Authentication key header plus the raw key material.
    AuthKey {
        key: SadbKey,
        material: Vec<u8>,
    },
    /// Encryption key header plus the raw key material.
    EncryptKey {
        key: SadbKey,
        material: Vec<u8>,
    },
    SpiRange(SadbSpirange),
    /// Proposal header plus its transform combinations. Decode only.
    Proposal {
        prop: SadbProp,
        combs: Vec<SadbComb>,
    },
    /// Supported authentication algorithms. Decode only.
    SupportedAuth {
        supported: SadbSupported,
        algs: Vec<SadbAlg>,
    },
    /// Supported encryption algorithms. Decode only.
    SupportedEncrypt {
        supported: SadbSupported,
        algs: Vec<SadbAlg>,
    },
    /// Policy extension. Decode only.
    XPolicy(SadbXPolicy),
    /// An extension this codec recognizes but does not interpret
    /// (ADDRESS_PROXY, X_KMPRIVATE, X_SA2). Holds the whole record,
    /// header included, so the bytes survive a round trip.
    Opaque {
        ext_type: u16,
        data: Vec<u8>,
    },
}

impl Extension {
    /// The numeric extension type of this variant.
    pub fn ext_type(&self) -> u16 {
        match self {
            Extension::Sa(_) => ext_type::SA,
            Extension::LifetimeCurrent(_) => ext_type::LIFETIME_CURRENT,
            Extension::LifetimeHard(_) => ext_type::LIFETIME_HARD,
            Extension::LifetimeSoft(_) => ext_type::LIFETIME_SOFT,
            Extension::AddressSrc { .. } => ext_type::ADDRESS_SRC,
            Extension::AddressDst { .. } => ext_type::ADDRESS_DST,
            Extension::AuthKey { .. } => ext_type::KEY_AUTH,
            Extension::EncryptKey { .. } => ext_type::KEY_ENCRYPT,
            Extension::SpiRange(_) => ext_type::SPIRANGE,
            Extension::Proposal { .. } => ext_type::PROPOSAL,
            Extension::SupportedAuth { .. } => ext_type::SUPPORTED_AUTH,
            Extension::SupportedEncrypt { .. } => ext_type::SUPPORTED_ENCRYPT,
            Extension::XPolicy(_) => ext_type::X_POLICY,
            Extension::Opaque { ext_type, .. } => *ext_type,
        }
    }

    /// The word length this extension's header field must carry.
    pub fn word_len(&self) -> u16 {
        match self {
            Extension::Sa(_) => SadbSa::WORDS,
            Extension::LifetimeCurrent(_)
            | Extension::LifetimeHard(_)
            | Extension::LifetimeSoft(_) => SadbLifetime::WORDS,
            Extension::AddressSrc { .. } | Extension::AddressDst { .. } => {
                SadbAddress::WORDS + SockAddrIn::WORDS
            }
            Extension::AuthKey { material, .. } | Extension::EncryptKey { material, .. } => {
                SadbKey::WORDS + material.len().div_ceil(WORD) as u16
            }
            Extension::SpiRange(_) => SadbSpirange::WORDS,
            Extension::Proposal { combs, .. } => SadbProp::WORDS + combs.len() as u16,
            Extension::SupportedAuth { algs, .. } | Extension::SupportedEncrypt { algs, .. } => {
                SadbSupported::WORDS + algs.len() as u16
            }
            Extension::XPolicy(_) => SadbXPolicy::WORDS,
            Extension::Opaque { data, .. } => (data.len() / WORD) as u16,
        }
    }

    /// Position in the canonical serialization order.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Extension::Sa(_) => 0,
            Extension::LifetimeCurrent(_) => 1,
            Extension::LifetimeHard(_) => 2,
            Extension::LifetimeSoft(_) => 3,
            Extension::AddressSrc { .. } => 4,
            Extension::AddressDst { .. } => 5,
            Extension::AuthKey { .. } => 6,
            Extension::EncryptKey { .. } => 7,
            Extension::SpiRange(_) => 8,
            Extension::Proposal { .. } => 9,
            Extension::XPolicy(_) => 10,
            Extension::SupportedAuth { .. } => 11,
            Extension::SupportedEncrypt { .. } => 12,
            Extension::Opaque { .. } => 13,
        }
    }

    /// Serialize this extension into `buf`.
    ///
    /// Extensions the codec only ever receives (PROPOSAL, X_POLICY and the
    /// SUPPORTED tables) report [`Error::NotImplemented`] instead of
    /// guessing at an encoding. Opaque records are written back verbatim.
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            Extension::Sa(sa) => buf.extend_from_slice(sa.as_bytes()),
            Extension::LifetimeCurrent(lt)
            | Extension::LifetimeHard(lt)
            | Extension::LifetimeSoft(lt) => buf.extend_from_slice(lt.as_bytes()),
            Extension::AddressSrc { addr, sockaddr } | Extension::AddressDst { addr, sockaddr } => {
                buf.extend_from_slice(addr.as_bytes());
                buf.extend_from_slice(sockaddr.as_bytes());
            }
            Extension::AuthKey { key, material } | Extension::EncryptKey { key, material } => {
                buf.extend_from_slice(key.as_bytes());
                if key.sadb_key_len > SadbKey::WORDS {
                    buf.extend_from_slice(material);
                    // Pad the key material out to the declared word boundary.
                    let total = key.sadb_key_len as usize * WORD;
                    let written = SadbKey::SIZE + material.len();
                    buf.resize(buf.len() + (total - written), 0);
                }
            }
            Extension::SpiRange(range) => buf.extend_from_slice(range.as_bytes()),
            Extension::Proposal { .. }
            | Extension::SupportedAuth { .. }
            | Extension::SupportedEncrypt { .. }
            | Extension::XPolicy(_) => {
                return Err(Error::NotImplemented {
                    ext_type: self.ext_type(),
                });
            }
            Extension::Opaque { data, .. } => buf.extend_from_slice(data),
        }
        Ok(())
    }
}
