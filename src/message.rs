//! The PF_KEY message aggregate.
//!
//! A [`Message`] is a base header plus a set of extensions. Outbound
//! messages are built empty, populated through the `set_*` methods (which
//! always stamp the canonical extension type and length, so callers cannot
//! produce inconsistent headers) and serialized with [`Message::to_bytes`].
//! Inbound messages come out of [`Message::from_bytes`].

use std::fmt;

use zerocopy::IntoBytes;

use crate::error::Result;
use crate::ext::Extension;
use crate::parse;
use crate::types::{
    Endpoint, PF_KEY_V2, SadbAddress, SadbAlg, SadbComb, SadbKey, SadbLifetime, SadbMsg, SadbProp,
    SadbSa, SadbSpirange, SadbXPolicy, SockAddrIn, ext_type,
};

/// A full PF_KEY message: base header and extensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    /// The base header. `sadb_msg_len` and `sadb_msg_version` are stamped
    /// by [`Message::compute_len`] before every serialization.
    pub header: SadbMsg,
    extensions: Vec<Extension>,
}

impl Message {
    /// Create an empty message with the given type and SA type.
    pub fn new(msg_type: u8, satype: u8) -> Self {
        Self {
            header: SadbMsg {
                sadb_msg_version: PF_KEY_V2,
                sadb_msg_type: msg_type,
                sadb_msg_satype: satype,
                ..Default::default()
            },
            extensions: Vec::new(),
        }
    }

    /// Parse a message from the bytes of one socket read.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        parse::parse_message(data)
    }

    /// All extensions present on this message, in canonical order.
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// Insert an extension, replacing any existing one of the same type.
    /// New extensions land at their canonical position, so the set stays
    /// in serialization order no matter how it was built.
    pub(crate) fn put(&mut self, ext: Extension) {
        let ty = ext.ext_type();
        if let Some(slot) = self.extensions.iter_mut().find(|e| e.ext_type() == ty) {
            *slot = ext;
            return;
        }
        let pos = self.extensions.partition_point(|e| e.rank() <= ext.rank());
        self.extensions.insert(pos, ext);
    }

    fn find(&self, ty: u16) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.ext_type() == ty)
    }

    fn has(&self, ty: u16) -> bool {
        self.find(ty).is_some()
    }

    // ------------------------------------------------------------------
    // Setters. Each stamps the canonical exttype and word length.
    // ------------------------------------------------------------------

    /// Set the SA extension.
    pub fn set_sa(&mut self, mut sa: SadbSa) {
        sa.sadb_sa_exttype = ext_type::SA;
        sa.sadb_sa_len = SadbSa::WORDS;
        self.put(Extension::Sa(sa));
    }

    /// Set the current-lifetime extension.
    pub fn set_lifetime_current(&mut self, mut lt: SadbLifetime) {
        lt.sadb_lifetime_exttype = ext_type::LIFETIME_CURRENT;
        lt.sadb_lifetime_len = SadbLifetime::WORDS;
        self.put(Extension::LifetimeCurrent(lt));
    }

    /// Set the hard-lifetime extension.
    pub fn set_lifetime_hard(&mut self, mut lt: SadbLifetime) {
        lt.sadb_lifetime_exttype = ext_type::LIFETIME_HARD;
        lt.sadb_lifetime_len = SadbLifetime::WORDS;
        self.put(Extension::LifetimeHard(lt));
    }

    /// Set the soft-lifetime extension.
    pub fn set_lifetime_soft(&mut self, mut lt: SadbLifetime) {
        lt.sadb_lifetime_exttype = ext_type::LIFETIME_SOFT;
        lt.sadb_lifetime_len = SadbLifetime::WORDS;
        self.put(Extension::LifetimeSoft(lt));
    }

    /// Set the source address extension from an endpoint.
    pub fn set_address_src(&mut self, src: Endpoint) {
        self.put(Extension::AddressSrc {
            addr: address_header(ext_type::ADDRESS_SRC),
            sockaddr: src.to_sockaddr(),
        });
    }

    /// Set the destination address extension from an endpoint.
    pub fn set_address_dst(&mut self, dst: Endpoint) {
        self.put(Extension::AddressDst {
            addr: address_header(ext_type::ADDRESS_DST),
            sockaddr: dst.to_sockaddr(),
        });
    }

    /// Set the authentication key extension. `bits` is the key size in
    /// bits; `material` carries the raw key bytes.
    pub fn set_auth_key(&mut self, material: &[u8], bits: u16) {
        self.put(Extension::AuthKey {
            key: key_header(ext_type::KEY_AUTH, material, bits),
            material: material.to_vec(),
        });
    }

    /// Set the encryption key extension.
    pub fn set_encrypt_key(&mut self, material: &[u8], bits: u16) {
        self.put(Extension::EncryptKey {
            key: key_header(ext_type::KEY_ENCRYPT, material, bits),
            material: material.to_vec(),
        });
    }

    /// Set the SPI range extension.
    pub fn set_spi_range(&mut self, min: u32, max: u32) {
        self.put(Extension::SpiRange(SadbSpirange {
            sadb_spirange_len: SadbSpirange::WORDS,
            sadb_spirange_exttype: ext_type::SPIRANGE,
            sadb_spirange_min: min,
            sadb_spirange_max: max,
            sadb_spirange_reserved: 0,
        }));
    }

    // ------------------------------------------------------------------
    // Presence queries.
    // ------------------------------------------------------------------

    pub fn has_sa(&self) -> bool {
        self.has(ext_type::SA)
    }

    pub fn has_lifetime_current(&self) -> bool {
        self.has(ext_type::LIFETIME_CURRENT)
    }

    pub fn has_lifetime_hard(&self) -> bool {
        self.has(ext_type::LIFETIME_HARD)
    }

    pub fn has_lifetime_soft(&self) -> bool {
        self.has(ext_type::LIFETIME_SOFT)
    }

    pub fn has_address_src(&self) -> bool {
        self.has(ext_type::ADDRESS_SRC)
    }

    pub fn has_address_dst(&self) -> bool {
        self.has(ext_type::ADDRESS_DST)
    }

    pub fn has_auth_key(&self) -> bool {
        self.has(ext_type::KEY_AUTH)
    }

    pub fn has_encrypt_key(&self) -> bool {
        self.has(ext_type::KEY_ENCRYPT)
    }

    pub fn has_spi_range(&self) -> bool {
        self.has(ext_type::SPIRANGE)
    }

    pub fn has_proposal(&self) -> bool {
        self.has(ext_type::PROPOSAL)
    }

    pub fn has_supported_auth(&self) -> bool {
        self.has(ext_type::SUPPORTED_AUTH)
    }

    pub fn has_supported_encrypt(&self) -> bool {
        self.has(ext_type::SUPPORTED_ENCRYPT)
    }

    pub fn has_x_policy(&self) -> bool {
        self.has(ext_type::X_POLICY)
    }

    // ------------------------------------------------------------------
    // Typed accessors.
    // ------------------------------------------------------------------

    pub fn sa(&self) -> Option<&SadbSa> {
        match self.find(ext_type::SA) {
            Some(Extension::Sa(sa)) => Some(sa),
            _ => None,
        }
    }

    pub fn lifetime_current(&self) -> Option<&SadbLifetime> {
        match self.find(ext_type::LIFETIME_CURRENT) {
            Some(Extension::LifetimeCurrent(lt)) => Some(lt),
            _ => None,
        }
    }

    pub fn lifetime_hard(&self) -> Option<&SadbLifetime> {
        match self.find(ext_type::LIFETIME_HARD) {
            Some(Extension::LifetimeHard(lt)) => Some(lt),
            _ => None,
        }
    }

    pub fn lifetime_soft(&self) -> Option<&SadbLifetime> {
        match self.find(ext_type::LIFETIME_SOFT) {
            Some(Extension::LifetimeSoft(lt)) => Some(lt),
            _ => None,
        }
    }

    /// The source endpoint, if an ADDRESS_SRC extension is present.
    pub fn address_src(&self) -> Option<Endpoint> {
        match self.find(ext_type::ADDRESS_SRC) {
            Some(Extension::AddressSrc { sockaddr, .. }) => Some(Endpoint::from(*sockaddr)),
            _ => None,
        }
    }

    /// The destination endpoint, if an ADDRESS_DST extension is present.
    pub fn address_dst(&self) -> Option<Endpoint> {
        match self.find(ext_type::ADDRESS_DST) {
            Some(Extension::AddressDst { sockaddr, .. }) => Some(Endpoint::from(*sockaddr)),
            _ => None,
        }
    }

    /// The authentication key header and material.
    pub fn auth_key(&self) -> Option<(&SadbKey, &[u8])> {
        match self.find(ext_type::KEY_AUTH) {
            Some(Extension::AuthKey { key, material }) => Some((key, material)),
            _ => None,
        }
    }

    /// The encryption key header and material.
    pub fn encrypt_key(&self) -> Option<(&SadbKey, &[u8])> {
        match self.find(ext_type::KEY_ENCRYPT) {
            Some(Extension::EncryptKey { key, material }) => Some((key, material)),
            _ => None,
        }
    }

    pub fn spi_range(&self) -> Option<&SadbSpirange> {
        match self.find(ext_type::SPIRANGE) {
            Some(Extension::SpiRange(range)) => Some(range),
            _ => None,
        }
    }

    pub fn proposal(&self) -> Option<(&SadbProp, &[SadbComb])> {
        match self.find(ext_type::PROPOSAL) {
            Some(Extension::Proposal { prop, combs }) => Some((prop, combs)),
            _ => None,
        }
    }

    pub fn supported_auth(&self) -> Option<&[SadbAlg]> {
        match self.find(ext_type::SUPPORTED_AUTH) {
            Some(Extension::SupportedAuth { algs, .. }) => Some(algs),
            _ => None,
        }
    }

    pub fn supported_encrypt(&self) -> Option<&[SadbAlg]> {
        match self.find(ext_type::SUPPORTED_ENCRYPT) {
            Some(Extension::SupportedEncrypt { algs, .. }) => Some(algs),
            _ => None,
        }
    }

    pub fn x_policy(&self) -> Option<&SadbXPolicy> {
        match self.find(ext_type::X_POLICY) {
            Some(Extension::XPolicy(policy)) => Some(policy),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Serialization.
    // ------------------------------------------------------------------

    /// Stamp the version and total word length into the base header.
    ///
    /// Runs implicitly at the start of [`Message::to_bytes`]; rerun it if
    /// extensions change after an explicit call.
    pub fn compute_len(&mut self) {
        self.header.sadb_msg_version = PF_KEY_V2;
        let ext_words: u16 = self.extensions.iter().map(|e| e.word_len()).sum();
        self.header.sadb_msg_len = SadbMsg::WORDS + ext_words;
    }

    /// Serialize the message: base header first, then every present
    /// extension in canonical order, whatever order they were set in.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.compute_len();

        let mut buf = Vec::with_capacity(self.header.sadb_msg_len as usize * crate::types::WORD);
        buf.extend_from_slice(self.header.as_bytes());
        for ext in &self.extensions {
            ext.write_to(&mut buf)?;
        }

        Ok(buf)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.header)?;
        for ext in &self.extensions {
            write!(f, " {:?}", ext)?;
        }
        Ok(())
    }
}

fn address_header(exttype: u16) -> SadbAddress {
    SadbAddress {
        sadb_address_len: SadbAddress::WORDS + SockAddrIn::WORDS,
        sadb_address_exttype: exttype,
        sadb_address_proto: 0,
        sadb_address_prefixlen: 32,
        sadb_address_reserved: 0,
    }
}

fn key_header(exttype: u16, material: &[u8], bits: u16) -> SadbKey {
    SadbKey {
        sadb_key_len: SadbKey::WORDS + material.len().div_ceil(crate::types::WORD) as u16,
        sadb_key_exttype: exttype,
        sadb_key_bits: bits,
        sadb_key_reserved: 0,
    }
}
