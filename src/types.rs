//! PF_KEY wire structures and protocol constants from RFC 2367.
//!
//! Every record here mirrors the corresponding `sadb_*` C struct byte for
//! byte. All length fields count 64-bit words; helpers on each struct expose
//! the fixed word length the header must carry.

use std::net::Ipv4Addr;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// One PF_KEY word is 8 bytes; every length field is in word units.
pub const WORD: usize = 8;

/// PF_KEY protocol version, the only one that exists.
pub const PF_KEY_V2: u8 = 2;

/// Default SPI range requested by GETSPI.
pub const SPI_RANGE_MIN: u32 = 10;
/// Default SPI range requested by GETSPI.
pub const SPI_RANGE_MAX: u32 = 10_000_000;

/// PF_KEY message types (sadb_msg_type).
pub struct MsgType;

impl MsgType {
    pub const GETSPI: u8 = 1;
    pub const ADD: u8 = 3;
    pub const DELETE: u8 = 4;
    pub const UPDATE: u8 = 6;
    pub const REGISTER: u8 = 7;
    pub const FLUSH: u8 = 9;
    pub const DUMP: u8 = 10;
}

/// SA types (sadb_msg_satype).
pub struct SaType;

impl SaType {
    pub const ESP: u8 = 3;
}

/// SA states (sadb_sa_state).
pub struct SaState;

impl SaState {
    pub const LARVAL: u8 = 0;
    pub const MATURE: u8 = 1;
    pub const DYING: u8 = 2;
    pub const DEAD: u8 = 3;
}

/// Extension type codes (sadb_ext_type).
pub mod ext_type {
    pub const SA: u16 = 1;
    pub const LIFETIME_CURRENT: u16 = 2;
    pub const LIFETIME_HARD: u16 = 3;
    pub const LIFETIME_SOFT: u16 = 4;
    pub const ADDRESS_SRC: u16 = 5;
    pub const ADDRESS_DST: u16 = 6;
    pub const ADDRESS_PROXY: u16 = 7;
    pub const KEY_AUTH: u16 = 8;
    pub const KEY_ENCRYPT: u16 = 9;
    pub const PROPOSAL: u16 = 13;
    pub const SUPPORTED_AUTH: u16 = 14;
    pub const SUPPORTED_ENCRYPT: u16 = 15;
    pub const SPIRANGE: u16 = 16;
    pub const X_KMPRIVATE: u16 = 17;
    pub const X_POLICY: u16 = 18;
    pub const X_SA2: u16 = 19;
}

/// Base message header (struct sadb_msg), fixed 2 words.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SadbMsg {
    /// Protocol version, always [`PF_KEY_V2`].
    pub sadb_msg_version: u8,
    /// Command ([`MsgType`]).
    pub sadb_msg_type: u8,
    /// Errno, set by the kernel on replies.
    pub sadb_msg_errno: u8,
    /// SA protocol ([`SaType`]).
    pub sadb_msg_satype: u8,
    /// Total message length in words, extensions included.
    pub sadb_msg_len: u16,
    pub sadb_msg_reserved: u16,
    /// Sequence number; replies echo the request's.
    pub sadb_msg_seq: u32,
    /// Process ID of the originating key-management socket.
    pub sadb_msg_pid: u32,
}

impl SadbMsg {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const WORDS: u16 = (Self::SIZE / WORD) as u16;
}

/// SA extension (struct sadb_sa), fixed 2 words.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SadbSa {
    pub sadb_sa_len: u16,
    pub sadb_sa_exttype: u16,
    /// SPI, carried in network byte order. Use [`Self::spi_host_order`].
    pub sadb_sa_spi: u32,
    pub sadb_sa_replay: u8,
    pub sadb_sa_state: u8,
    pub sadb_sa_auth: u8,
    pub sadb_sa_encrypt: u8,
    pub sadb_sa_flags: u32,
}

impl SadbSa {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const WORDS: u16 = (Self::SIZE / WORD) as u16;

    /// The SPI in host byte order.
    ///
    /// The SPI is the one field of the struct stored in network order on the
    /// wire; this accessor undoes the swap. Do not blanket-convert the rest
    /// of the struct.
    pub fn spi_host_order(&self) -> u32 {
        u32::from_be(self.sadb_sa_spi)
    }
}

/// Lifetime extension (struct sadb_lifetime), fixed 4 words. Appears three
/// times per SA: current, hard and soft, distinguished by exttype.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SadbLifetime {
    pub sadb_lifetime_len: u16,
    pub sadb_lifetime_exttype: u16,
    pub sadb_lifetime_allocations: u32,
    pub sadb_lifetime_bytes: u64,
    pub sadb_lifetime_addtime: u64,
    pub sadb_lifetime_usetime: u64,
}

impl SadbLifetime {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const WORDS: u16 = (Self::SIZE / WORD) as u16;
}

/// Address extension header (struct sadb_address), fixed 1 word. The
/// sockaddr record follows immediately in the same word stream.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SadbAddress {
    pub sadb_address_len: u16,
    pub sadb_address_exttype: u16,
    pub sadb_address_proto: u8,
    pub sadb_address_prefixlen: u8,
    pub sadb_address_reserved: u16,
}

impl SadbAddress {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const WORDS: u16 = (Self::SIZE / WORD) as u16;
}

/// IPv4 socket address (struct sockaddr_in), 2 words, trailing an ADDRESS
/// extension.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SockAddrIn {
    pub sin_family: u16,
    pub sin_port: u16,
    pub sin_addr: [u8; 4],
    pub sin_zero: [u8; 8],
}

impl SockAddrIn {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const WORDS: u16 = (Self::SIZE / WORD) as u16;

    /// Check the address family is AF_INET, the only family this codec
    /// handles.
    pub fn is_inet(&self) -> bool {
        self.sin_family == libc::AF_INET as u16
    }
}

/// Key extension header (struct sadb_key), 1 word. Key material of
/// `(bits + 7) / 8` bytes follows, padded to a word boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SadbKey {
    pub sadb_key_len: u16,
    pub sadb_key_exttype: u16,
    pub sadb_key_bits: u16,
    pub sadb_key_reserved: u16,
}

impl SadbKey {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const WORDS: u16 = (Self::SIZE / WORD) as u16;

    /// Bytes of key material the bits field implies.
    pub fn key_bytes(&self) -> usize {
        (self.sadb_key_bits as usize).div_ceil(8)
    }
}

/// Proposal extension header (struct sadb_prop), 1 word. COMB records
/// follow.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SadbProp {
    pub sadb_prop_len: u16,
    pub sadb_prop_exttype: u16,
    pub sadb_prop_replay: u8,
    pub sadb_prop_reserved: [u8; 3],
}

impl SadbProp {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const WORDS: u16 = (Self::SIZE / WORD) as u16;
}

/// One proposed transform combination inside a PROPOSAL extension.
///
/// Packed: the 20-byte fixed prefix leaves the u64 block unaligned, and the
/// kernel writes the record without padding.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SadbComb {
    pub sadb_comb_auth: u8,
    pub sadb_comb_encrypt: u8,
    pub sadb_comb_flags: u16,
    pub sadb_comb_auth_minbits: u16,
    pub sadb_comb_auth_maxbits: u16,
    pub sadb_comb_reserved: u32,
    pub sadb_comb_soft_allocations: u32,
    pub sadb_comb_hard_allocations: u32,
    pub sadb_comb_soft_bytes: u64,
    pub sadb_comb_hard_bytes: u64,
    pub sadb_comb_soft_addtime: u64,
    pub sadb_comb_hard_addtime: u64,
    pub sadb_comb_soft_usetime: u64,
    pub sadb_comb_hard_usetime: u64,
}

impl SadbComb {
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Supported-algorithms extension header (struct sadb_supported), 1 word.
/// `len - 1` ALG records follow.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SadbSupported {
    pub sadb_supported_len: u16,
    pub sadb_supported_exttype: u16,
    pub sadb_supported_reserved: u32,
}

impl SadbSupported {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const WORDS: u16 = (Self::SIZE / WORD) as u16;
}

/// One supported algorithm (struct sadb_alg), 1 word.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SadbAlg {
    pub sadb_alg_id: u8,
    pub sadb_alg_ivlen: u8,
    pub sadb_alg_minbits: u16,
    pub sadb_alg_maxbits: u16,
    pub sadb_alg_reserved: u16,
}

impl SadbAlg {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const WORDS: u16 = (Self::SIZE / WORD) as u16;
}

/// SPI range extension (struct sadb_spirange), fixed 2 words.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SadbSpirange {
    pub sadb_spirange_len: u16,
    pub sadb_spirange_exttype: u16,
    pub sadb_spirange_min: u32,
    pub sadb_spirange_max: u32,
    pub sadb_spirange_reserved: u32,
}

impl SadbSpirange {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const WORDS: u16 = (Self::SIZE / WORD) as u16;
}

/// Linux policy extension (struct sadb_x_policy), fixed 2 words. Only
/// decoded, never emitted.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SadbXPolicy {
    pub sadb_x_policy_len: u16,
    pub sadb_x_policy_exttype: u16,
    pub sadb_x_policy_type: u16,
    pub sadb_x_policy_dir: u8,
    pub sadb_x_policy_reserved: u8,
    pub sadb_x_policy_id: u32,
    pub sadb_x_policy_priority: u32,
}

impl SadbXPolicy {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const WORDS: u16 = (Self::SIZE / WORD) as u16;
}

/// One end of a Security Association: an IPv4 host and port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub addr: Ipv4Addr,
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint with port 0 (the common case for ESP tunnels).
    pub fn new(addr: Ipv4Addr) -> Self {
        Self { addr, port: 0 }
    }

    /// Create an endpoint with an explicit port.
    pub fn with_port(addr: Ipv4Addr, port: u16) -> Self {
        Self { addr, port }
    }

    /// Build the on-wire sockaddr_in record for this endpoint.
    pub fn to_sockaddr(self) -> SockAddrIn {
        SockAddrIn {
            sin_family: libc::AF_INET as u16,
            sin_port: self.port,
            sin_addr: self.addr.octets(),
            sin_zero: [0u8; 8],
        }
    }
}

impl From<SockAddrIn> for Endpoint {
    fn from(sa: SockAddrIn) -> Self {
        Self {
            addr: Ipv4Addr::from(sa.sin_addr),
            port: sa.sin_port,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.port == 0 {
            write!(f, "{}", self.addr)
        } else {
            write!(f, "{}:{}", self.addr, self.port)
        }
    }
}
