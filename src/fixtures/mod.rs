//! PF_KEY message fixtures for testing.
//!
//! Pre-captured kernel replies, so message parsing can be tested without an
//! AF_KEY socket (which needs CAP_NET_ADMIN). All byte order is
//! little-endian as on the capture host.

/// SADB_DUMP reply for a database holding one ESP association.
///
/// 32 words: base header, SA, the three lifetimes, both addresses, a proxy
/// address, the encryption key and an SA2 record.
pub fn dump_reply() -> Vec<u8> {
    vec![
        // sadb_msg: version=2, type=10 (DUMP), errno=0, satype=3 (ESP),
        // len=32, seq=0, pid=2663
        2, 10, 0, 3, 32, 0, 0, 0, 0, 0, 0, 0, 103, 10, 0, 0, //
        // SA: len=2, type=1, spi=0xAAC61E00 (2865110528), state=MATURE,
        // encrypt=12
        2, 0, 1, 0, 0, 30, 198, 170, 0, 1, 0, 12, 0, 0, 0, 0, //
        // LIFETIME_HARD: len=4, type=3, all zero
        4, 0, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
        // LIFETIME_SOFT: len=4, type=4, all zero
        4, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
        // LIFETIME_CURRENT: len=4, type=2, allocations=11, bytes=704,
        // addtime=1494201315, usetime=1494201316
        4, 0, 2, 0, 11, 0, 0, 0, 192, 2, 0, 0, 0, 0, 0, 0, //
        227, 179, 15, 89, 0, 0, 0, 0, 228, 179, 15, 89, 0, 0, 0, 0, //
        // ADDRESS_SRC: len=3, type=5, prefixlen=32; sockaddr_in 10.0.2.7
        3, 0, 5, 0, 0, 32, 0, 0, //
        2, 0, 0, 0, 10, 0, 2, 7, 0, 0, 0, 0, 0, 0, 0, 0, //
        // ADDRESS_DST: len=3, type=6, prefixlen=32; sockaddr_in 10.0.2.6
        3, 0, 6, 0, 0, 32, 0, 0, //
        2, 0, 0, 0, 10, 0, 2, 6, 0, 0, 0, 0, 0, 0, 0, 0, //
        // ADDRESS_PROXY: len=3, type=7 (carried through uninterpreted)
        3, 0, 7, 0, 255, 0, 0, 0, //
        2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
        // KEY_ENCRYPT: len=5, type=9, bits=256, then 32 key bytes
        5, 0, 9, 0, 0, 1, 0, 0, //
        40, 141, 178, 141, 242, 74, 142, 67, 237, 231, 145, 81, 148, 10, 249, 253, //
        77, 164, 119, 141, 106, 73, 193, 49, 35, 84, 139, 157, 95, 216, 244, 48, //
        // X_SA2: len=2, type=19 (carried through uninterpreted)
        2, 0, 19, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    ]
}

/// The 32-byte encryption key carried by [`dump_reply`].
pub fn dump_reply_key() -> Vec<u8> {
    vec![
        40, 141, 178, 141, 242, 74, 142, 67, 237, 231, 145, 81, 148, 10, 249, 253, //
        77, 164, 119, 141, 106, 73, 193, 49, 35, 84, 139, 157, 95, 216, 244, 48,
    ]
}

/// SADB_DUMP reply for an empty database: a bare base header with
/// errno=ENOENT.
pub fn dump_reply_empty() -> Vec<u8> {
    vec![2, 10, 2, 3, 2, 0, 0, 0, 0, 0, 0, 0, 147, 13, 0, 0]
}

/// SADB_REGISTER reply listing the kernel's supported algorithms:
/// 8 authentication and 10 encryption entries, 22 words total.
pub fn register_reply() -> Vec<u8> {
    vec![
        // sadb_msg: version=2, type=7 (REGISTER), satype=3, len=22, pid=1509
        2, 7, 0, 3, 22, 0, 0, 0, 0, 0, 0, 0, 229, 5, 0, 0, //
        // SUPPORTED_AUTH: len=9, type=14
        9, 0, 14, 0, 0, 0, 0, 0, //
        // sadb_alg: id, ivlen, minbits, maxbits, reserved
        251, 0, 0, 0, 0, 0, 0, 0, //
        2, 0, 128, 0, 128, 0, 0, 0, //
        3, 0, 160, 0, 160, 0, 0, 0, //
        5, 0, 0, 1, 0, 1, 0, 0, //
        6, 0, 128, 1, 128, 1, 0, 0, //
        7, 0, 0, 2, 0, 2, 0, 0, //
        8, 0, 160, 0, 160, 0, 0, 0, //
        9, 0, 128, 0, 128, 0, 0, 0, //
        // SUPPORTED_ENCRYPT: len=11, type=15
        11, 0, 15, 0, 0, 0, 0, 0, //
        11, 0, 0, 0, 0, 0, 0, 0, //
        2, 8, 64, 0, 64, 0, 0, 0, //
        3, 8, 192, 0, 192, 0, 0, 0, //
        6, 8, 40, 0, 128, 0, 0, 0, //
        7, 8, 40, 0, 192, 1, 0, 0, //
        12, 8, 128, 0, 0, 1, 0, 0, //
        252, 8, 128, 0, 0, 1, 0, 0, //
        22, 8, 128, 0, 0, 1, 0, 0, //
        253, 8, 128, 0, 0, 1, 0, 0, //
        13, 8, 160, 0, 32, 1, 0, 0, //
    ]
}

/// A type-6 reply carrying addresses, an empty PROPOSAL and an X_POLICY
/// record, 11 words total.
pub fn update_reply() -> Vec<u8> {
    vec![
        // sadb_msg: version=2, type=6, satype=3, len=11, seq=1
        2, 6, 0, 3, 11, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, //
        // ADDRESS_SRC: 10.0.2.6
        3, 0, 5, 0, 0, 32, 0, 0, //
        2, 0, 0, 0, 10, 0, 2, 6, 0, 0, 0, 0, 0, 0, 0, 0, //
        // ADDRESS_DST: 10.0.2.7
        3, 0, 6, 0, 0, 32, 0, 0, //
        2, 0, 0, 0, 10, 0, 2, 7, 0, 0, 0, 0, 0, 0, 0, 0, //
        // PROPOSAL: len=1 (no combs), replay=32
        1, 0, 13, 0, 32, 0, 0, 0, //
        // X_POLICY: len=2, type=2, dir=2, id=89, priority=0x80000000
        2, 0, 18, 0, 2, 0, 2, 0, 89, 0, 0, 0, 0, 0, 0, 128, //
    ]
}
