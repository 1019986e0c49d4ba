//! Builders for the PF_KEY commands a key manager sends.
//!
//! Every builder stamps the calling process id into the base header. The
//! ADD/UPDATE parameters the protocol leaves to policy (cipher, key size,
//! lifetimes) are configuration on [`SaBuilder`], with the conventional
//! defaults.

use crate::message::Message;
use crate::types::{
    Endpoint, MsgType, SPI_RANGE_MAX, SPI_RANGE_MIN, SaState, SaType, SadbLifetime, SadbSa,
};

/// Default encryption algorithm id for new associations (AES-CBC).
pub const DEFAULT_ENCRYPT_ALG: u8 = 12;
/// Default encryption key size in bits.
pub const DEFAULT_KEY_BITS: u16 = 256;
/// Default soft lifetime in seconds.
pub const DEFAULT_SOFT_ADDTIME: u64 = 60;
/// Default hard lifetime in seconds.
pub const DEFAULT_HARD_ADDTIME: u64 = 90;

fn base(msg_type: u8) -> Message {
    let mut msg = Message::new(msg_type, SaType::ESP);
    msg.header.sadb_msg_pid = std::process::id();
    msg
}

/// SADB_REGISTER: announce this process services ESP associations. The
/// reply carries the kernel's supported algorithm tables.
pub fn register() -> Message {
    base(MsgType::REGISTER)
}

/// SADB_FLUSH: drop every ESP association in the kernel database.
pub fn flush() -> Message {
    base(MsgType::FLUSH)
}

/// SADB_DUMP: enumerate the kernel's ESP associations.
pub fn dump() -> Message {
    base(MsgType::DUMP)
}

/// SADB_GETSPI with the conventional SPI range.
pub fn getspi(seq: u32, src: Endpoint, dst: Endpoint) -> Message {
    getspi_with_range(seq, src, dst, SPI_RANGE_MIN, SPI_RANGE_MAX)
}

/// SADB_GETSPI requesting an SPI out of an explicit range.
pub fn getspi_with_range(seq: u32, src: Endpoint, dst: Endpoint, min: u32, max: u32) -> Message {
    let mut msg = base(MsgType::GETSPI);
    msg.header.sadb_msg_seq = seq;
    msg.set_address_src(src);
    msg.set_address_dst(dst);
    msg.set_spi_range(min, max);
    msg
}

/// SADB_DELETE for the association identified by `spi` between `src` and
/// `dst`.
pub fn delete(spi: u32, src: Endpoint, dst: Endpoint) -> Message {
    let mut msg = base(MsgType::DELETE);
    msg.set_sa(SadbSa {
        sadb_sa_spi: spi,
        ..Default::default()
    });
    msg.set_address_src(src);
    msg.set_address_dst(dst);
    msg
}

/// Builder for SADB_ADD and SADB_UPDATE messages.
///
/// An UPDATE is an ADD with a different message type, so one builder
/// produces both.
///
/// # Example
///
/// ```ignore
/// let mut msg = SaBuilder::new(spi, src, dst)
///     .seq(seq)
///     .encrypt_key(key)
///     .build_add();
/// session.send(&mut msg)?;
/// ```
#[derive(Debug, Clone)]
pub struct SaBuilder {
    seq: u32,
    spi: u32,
    src: Endpoint,
    dst: Endpoint,
    encrypt_key: Vec<u8>,
    encrypt_alg: u8,
    key_bits: u16,
    soft_addtime: u64,
    hard_addtime: u64,
}

impl SaBuilder {
    /// Start a builder for the association identified by `spi` between
    /// `src` and `dst`, with the default cipher, key size and lifetimes.
    pub fn new(spi: u32, src: Endpoint, dst: Endpoint) -> Self {
        Self {
            seq: 0,
            spi,
            src,
            dst,
            encrypt_key: Vec::new(),
            encrypt_alg: DEFAULT_ENCRYPT_ALG,
            key_bits: DEFAULT_KEY_BITS,
            soft_addtime: DEFAULT_SOFT_ADDTIME,
            hard_addtime: DEFAULT_HARD_ADDTIME,
        }
    }

    /// Set the sequence number, usually the one GETSPI was sent with.
    pub fn seq(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }

    /// Set the raw encryption key material.
    pub fn encrypt_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.encrypt_key = key.into();
        self
    }

    /// Override the encryption algorithm id.
    pub fn encrypt_alg(mut self, alg: u8) -> Self {
        self.encrypt_alg = alg;
        self
    }

    /// Override the declared key size in bits.
    pub fn key_bits(mut self, bits: u16) -> Self {
        self.key_bits = bits;
        self
    }

    /// Override the soft and hard lifetimes, in seconds since creation.
    pub fn lifetimes(mut self, soft_addtime: u64, hard_addtime: u64) -> Self {
        self.soft_addtime = soft_addtime;
        self.hard_addtime = hard_addtime;
        self
    }

    /// Build an SADB_ADD creating a mature association.
    pub fn build_add(&self) -> Message {
        self.build(MsgType::ADD)
    }

    /// Build an SADB_UPDATE finishing a larval association.
    pub fn build_update(&self) -> Message {
        self.build(MsgType::UPDATE)
    }

    fn build(&self, msg_type: u8) -> Message {
        let mut msg = base(msg_type);
        msg.header.sadb_msg_seq = self.seq;

        msg.set_sa(SadbSa {
            sadb_sa_spi: self.spi,
            sadb_sa_state: SaState::MATURE,
            sadb_sa_encrypt: self.encrypt_alg,
            ..Default::default()
        });
        msg.set_lifetime_soft(SadbLifetime {
            sadb_lifetime_addtime: self.soft_addtime,
            ..Default::default()
        });
        msg.set_lifetime_hard(SadbLifetime {
            sadb_lifetime_addtime: self.hard_addtime,
            ..Default::default()
        });
        msg.set_address_src(self.src);
        msg.set_address_dst(self.dst);
        msg.set_encrypt_key(&self.encrypt_key, self.key_bits);

        msg.compute_len();
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn src() -> Endpoint {
        Endpoint::new(Ipv4Addr::new(1, 2, 3, 4))
    }

    fn dst() -> Endpoint {
        Endpoint::new(Ipv4Addr::new(5, 6, 7, 8))
    }

    /// Patch the current process id into bytes 12..16 of an expected wire
    /// image.
    fn with_pid(mut expected: Vec<u8>) -> Vec<u8> {
        expected[12..16].copy_from_slice(&std::process::id().to_ne_bytes());
        expected
    }

    #[test]
    fn test_dump_wire_bytes() {
        let bytes = dump().to_bytes().unwrap();
        let expected = with_pid(vec![2, 10, 0, 3, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_register_wire_bytes() {
        let bytes = register().to_bytes().unwrap();
        let expected = with_pid(vec![2, 7, 0, 3, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_flush_wire_bytes() {
        let bytes = flush().to_bytes().unwrap();
        let expected = with_pid(vec![2, 9, 0, 3, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_getspi_wire_bytes() {
        let bytes = getspi(1234, src(), dst()).to_bytes().unwrap();
        let expected = with_pid(vec![
            // base: GETSPI, ESP, 10 words, seq=1234
            2, 1, 0, 3, 10, 0, 0, 0, 210, 4, 0, 0, 0, 0, 0, 0, //
            // ADDRESS_SRC + sockaddr_in 1.2.3.4
            3, 0, 5, 0, 0, 32, 0, 0, //
            2, 0, 0, 0, 1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0, 0, //
            // ADDRESS_DST + sockaddr_in 5.6.7.8
            3, 0, 6, 0, 0, 32, 0, 0, //
            2, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0, 0, 0, 0, 0, //
            // SPIRANGE 10..10_000_000
            2, 0, 16, 0, 10, 0, 0, 0, 128, 150, 152, 0, 0, 0, 0, 0, //
        ]);
        assert_eq!(bytes.len(), 80);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_add_defaults() {
        let key = [
            40u8, 141, 178, 141, 242, 74, 142, 67, 237, 231, 145, 81, 148, 10, 249, 253, 77, 164,
            119, 141, 106, 73, 193, 49, 35, 84, 139, 157, 95, 216, 244, 48,
        ];
        let msg = SaBuilder::new(31337, src(), dst())
            .seq(1337)
            .encrypt_key(key.as_slice())
            .build_add();

        assert_eq!(msg.header.sadb_msg_type, MsgType::ADD);
        assert_eq!(msg.header.sadb_msg_seq, 1337);
        assert_eq!(msg.header.sadb_msg_len, 23);

        let sa = msg.sa().unwrap();
        assert_eq!(sa.sadb_sa_spi, 31337);
        assert_eq!(sa.sadb_sa_state, SaState::MATURE);
        assert_eq!(sa.sadb_sa_encrypt, 12);

        assert_eq!(msg.lifetime_soft().unwrap().sadb_lifetime_addtime, 60);
        assert_eq!(msg.lifetime_hard().unwrap().sadb_lifetime_addtime, 90);
        assert_eq!(msg.address_src().unwrap(), src());
        assert_eq!(msg.address_dst().unwrap(), dst());

        let (hdr, material) = msg.encrypt_key().unwrap();
        assert_eq!(hdr.sadb_key_len, 5);
        assert_eq!(hdr.sadb_key_bits, 256);
        assert_eq!(material, key);
    }

    #[test]
    fn test_update_differs_only_in_type() {
        let builder = SaBuilder::new(31337, src(), dst()).seq(1337).encrypt_key(vec![0u8; 32]);
        let add = builder.build_add();
        let update = builder.build_update();

        assert_eq!(update.header.sadb_msg_type, MsgType::UPDATE);
        assert_eq!(update.extensions(), add.extensions());
        assert_eq!(update.header.sadb_msg_len, add.header.sadb_msg_len);
    }

    #[test]
    fn test_builder_configuration_overrides() {
        let msg = SaBuilder::new(1, src(), dst())
            .encrypt_key(vec![0u8; 16])
            .encrypt_alg(22)
            .key_bits(128)
            .lifetimes(30, 45)
            .build_add();

        assert_eq!(msg.sa().unwrap().sadb_sa_encrypt, 22);
        assert_eq!(msg.encrypt_key().unwrap().0.sadb_key_bits, 128);
        assert_eq!(msg.lifetime_soft().unwrap().sadb_lifetime_addtime, 30);
        assert_eq!(msg.lifetime_hard().unwrap().sadb_lifetime_addtime, 45);
    }

    #[test]
    fn test_delete_extensions() {
        let mut msg = delete(9999, src(), dst());
        assert_eq!(msg.header.sadb_msg_type, MsgType::DELETE);
        assert!(msg.has_sa());
        assert!(msg.has_address_src());
        assert!(msg.has_address_dst());

        let bytes = msg.to_bytes().unwrap();
        assert_eq!(msg.header.sadb_msg_len, 10);
        assert_eq!(bytes.len(), 80);
    }

    #[test]
    fn test_getspi_custom_range() {
        let msg = getspi_with_range(1, src(), dst(), 256, 4096);
        let range = msg.spi_range().unwrap();
        assert_eq!(range.sadb_spirange_min, 256);
        assert_eq!(range.sadb_spirange_max, 4096);
    }
}
