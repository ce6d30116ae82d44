//! Fixed round-constant and coefficient tables for the two permutation widths.
//!
//! All round constants are canonical field elements (`< p`). The diagonal
//! tables list, per state index, the coefficient the internal linear layer
//! applies to that element's prior value.

/// Coefficient applied by the internal linear layer to one state element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagEntry {
    One,
    Two,
    Three,
    Four,
    NegTwo,
    NegThree,
    NegFour,
    /// multiply by `2^-k`
    InvPow2(usize),
    /// multiply by `-(2^-k)`
    NegInvPow2(usize),
}

/// Round-constant and coefficient tables for one permutation width.
pub struct Poseidon2Constants<const WIDTH: usize> {
    /// Per-round constants for the initial external rounds.
    pub initial: &'static [[u32; WIDTH]],
    /// Per-round constants for the terminal external rounds.
    pub terminal: &'static [[u32; WIDTH]],
    /// One constant per internal round, applied to element 0 only.
    pub internal: &'static [u32],
    /// Internal-layer coefficient per state index. Entries are pairwise
    /// distinct; index 0 always carries `NegTwo`.
    pub diagonal: &'static [DiagEntry; WIDTH],
}

pub static POSEIDON2_16_CONSTANTS: Poseidon2Constants<16> = Poseidon2Constants {
    initial: &RC16_INITIAL,
    terminal: &RC16_TERMINAL,
    internal: &RC16_INTERNAL,
    diagonal: &DIAG16,
};

pub static POSEIDON2_24_CONSTANTS: Poseidon2Constants<24> = Poseidon2Constants {
    initial: &RC24_INITIAL,
    terminal: &RC24_TERMINAL,
    internal: &RC24_INTERNAL,
    diagonal: &DIAG24,
};

const DIAG16: [DiagEntry; 16] = [
    DiagEntry::NegTwo,
    DiagEntry::One,
    DiagEntry::Two,
    DiagEntry::InvPow2(1),
    DiagEntry::Three,
    DiagEntry::Four,
    DiagEntry::NegInvPow2(1),
    DiagEntry::NegThree,
    DiagEntry::NegFour,
    DiagEntry::InvPow2(8),
    DiagEntry::InvPow2(3),
    DiagEntry::InvPow2(4),
    DiagEntry::NegInvPow2(8),
    DiagEntry::NegInvPow2(3),
    DiagEntry::NegInvPow2(4),
    DiagEntry::NegInvPow2(24),
];

const DIAG24: [DiagEntry; 24] = [
    DiagEntry::NegTwo,
    DiagEntry::One,
    DiagEntry::Two,
    DiagEntry::InvPow2(1),
    DiagEntry::Three,
    DiagEntry::Four,
    DiagEntry::NegInvPow2(1),
    DiagEntry::NegThree,
    DiagEntry::NegFour,
    DiagEntry::InvPow2(8),
    DiagEntry::InvPow2(2),
    DiagEntry::InvPow2(3),
    DiagEntry::InvPow2(4),
    DiagEntry::InvPow2(5),
    DiagEntry::InvPow2(6),
    DiagEntry::InvPow2(7),
    DiagEntry::InvPow2(9),
    DiagEntry::InvPow2(24),
    DiagEntry::NegInvPow2(8),
    DiagEntry::NegInvPow2(2),
    DiagEntry::NegInvPow2(3),
    DiagEntry::NegInvPow2(4),
    DiagEntry::NegInvPow2(16),
    DiagEntry::NegInvPow2(24),
];

#[rustfmt::skip]
const RC16_INITIAL: [[u32; 16]; 4] = [
    [
        0x5daf18ba, 0x136a72cd, 0x48b2e403, 0x71c936f5, 0x2e04d91a, 0x66f183c4, 0x0a9b5e27, 0x3dc8a1f0,
        0x529e7b68, 0x07d34c9e, 0x6b15f8a2, 0x1f80d36b, 0x44ab2c17, 0x78e6905d, 0x2c5b7fe9, 0x61038d4c,
    ],
    [
        0x0fe2a68b, 0x57149bd3, 0x33d7c025, 0x7a86e1f4, 0x1b4f3a9c, 0x62c85d10, 0x09a1f7e6, 0x4e7b2583,
        0x25f09c47, 0x6d3861ba, 0x180c4ef2, 0x5a92d705, 0x3e61b84d, 0x013f5a29, 0x74ae0c96, 0x2980f3d1,
    ],
    [
        0x4c17e86a, 0x10d5b39f, 0x67293c54, 0x3ba8f017, 0x7e5642c8, 0x22ed971b, 0x596a04e3, 0x0d38c67a,
        0x41f25b0e, 0x762d18c5, 0x1ea9d483, 0x5408763f, 0x2fb3e9a1, 0x6980152c, 0x35c74bd8, 0x02694e17,
    ],
    [
        0x6ef1820d, 0x1c4ab753, 0x50d3962e, 0x27b80f64, 0x73625a1f, 0x0b9ec4d8, 0x46217f93, 0x3d50ab06,
        0x118fd7e4, 0x64c3082a, 0x383a9d71, 0x5be64f18, 0x0451c3a6, 0x7d1e68f2, 0x2ab0345b, 0x52978ecd,
    ],
];

#[rustfmt::skip]
const RC16_TERMINAL: [[u32; 16]; 4] = [
    [
        0x19c6f30a, 0x5e72ad41, 0x349b08d7, 0x7168c5e2, 0x03fd4296, 0x4aae9153, 0x28157d6f, 0x6c80eb24,
        0x103e578d, 0x55c92af6, 0x3b06e138, 0x0e97b4ca, 0x62d40f5e, 0x37521c80, 0x7bcfa965, 0x246d80b3,
    ],
    [
        0x4f08d2c7, 0x150bb6e9, 0x68e4731d, 0x3c96f852, 0x01d24a30, 0x57b9e58f, 0x2d4601ac, 0x702f9cd4,
        0x1859ce46, 0x4db3270b, 0x23e8a5f1, 0x6f615498, 0x0ab4d82c, 0x454ef063, 0x316c2b97, 0x7c0d16e5,
    ],
    [
        0x2681c4fa, 0x635eab07, 0x0c3d8e61, 0x50f6172b, 0x39a052cd, 0x7592bf18, 0x12c70693, 0x473b9a5e,
        0x2056d1e8, 0x5dfe493a, 0x0a8327b4, 0x6749c0f6, 0x3215ea02, 0x6ece5847, 0x1d90b32f, 0x58647c90,
    ],
    [
        0x33db0f76, 0x06e89a21, 0x72a4c3b8, 0x2a1756ed, 0x5f4c80da, 0x14902e4f, 0x49df6583, 0x3c2ba916,
        0x60753df2, 0x0d1ce769, 0x563812a5, 0x21ed5b0c, 0x7ea604c1, 0x3f49d837, 0x08b7216e, 0x4b02f5aa,
    ],
];

#[rustfmt::skip]
const RC16_INTERNAL: [u32; 20] = [
    0x447a63d1, 0x1b2e07f8, 0x6091ca45, 0x35d8162a, 0x02b7598c, 0x57e3840b, 0x2d0af167, 0x73c4ad92,
    0x186d2f03, 0x4eb09c58, 0x29f867d4, 0x663b0ae1, 0x0f52c496, 0x5c81732d, 0x38a6e50f, 0x7419bf62,
    0x236084ab, 0x51cd3e78, 0x0c9fd215, 0x46e17b3c,
];

#[rustfmt::skip]
const RC24_INITIAL: [[u32; 24]; 4] = [
    [
        0x4be2c701, 0x16a59d3e, 0x6138f0b2, 0x2dcb4867, 0x780d25f9, 0x0a76e14c, 0x53f98b20, 0x3842d6a5,
        0x652a0e7b, 0x01b4738d, 0x4c8f25e6, 0x2761ba09, 0x72dca44f, 0x1f0391c8, 0x5a56ef32, 0x0e29087d,
        0x43bd5c96, 0x3670a2e1, 0x69052d48, 0x12e84f6a, 0x5d3bc025, 0x208e79b3, 0x7741136f, 0x2c9480dc,
    ],
    [
        0x09d7a3b5, 0x5e40c86f, 0x331265d0, 0x70a5fe18, 0x1c58094b, 0x65eb92a2, 0x285e47c6, 0x4fb1d03a,
        0x0364ba8e, 0x5897e671, 0x3d2a0c14, 0x125d93f7, 0x67f04e5a, 0x3a836d28, 0x7036218c, 0x1ae9cb40,
        0x541c76f3, 0x2f4f0da7, 0x6902a85b, 0x0cb5540e, 0x41683fe2, 0x75fb9a35, 0x1aaed189, 0x4e01674c,
    ],
    [
        0x27b4fc90, 0x6a47a624, 0x0dfa31d8, 0x52ad876b, 0x3760dc1f, 0x6b1308a3, 0x1ec69e56, 0x43792b0a,
        0x76cc85bd, 0x22df7041, 0x5592c6e4, 0x08451388, 0x3cf8a92c, 0x71ab3e7f, 0x155e9413, 0x48124fb6,
        0x7dc5215a, 0x2178b6fd, 0x562b0ca1, 0x0bde6245, 0x3f91f7e8, 0x6444598c, 0x18f7af2f, 0x4daa04d3,
    ],
    [
        0x105d8a76, 0x5510e01a, 0x29c435bd, 0x6e778b61, 0x032ae104, 0x47de36a8, 0x3c918c4b, 0x6144e2ef,
        0x14f83792, 0x59ab8d36, 0x2e5ee2d9, 0x7312387d, 0x07c58e20, 0x4c78e3c4, 0x312c3967, 0x65df8f0b,
        0x0a92e4ae, 0x4f463a52, 0x23f98ff5, 0x68ace599, 0x1d603b3c, 0x521390e0, 0x26c6e683, 0x6b7a3c27,
    ],
];

#[rustfmt::skip]
const RC24_TERMINAL: [[u32; 24]; 4] = [
    [
        0x602d91ca, 0x14e0676e, 0x4993bd11, 0x3e4712b5, 0x72fa6858, 0x07adbdfc, 0x3c61139f, 0x51146943,
        0x25c7bee6, 0x6a7b148a, 0x1f2e6a2d, 0x53e1bfd1, 0x08951574, 0x4d486b18, 0x31fbc0bb, 0x66af165f,
        0x0b626c02, 0x5015c1a6, 0x24c91749, 0x797c6ced, 0x1e2fc290, 0x42e31834, 0x37966dd7, 0x7c49c37b,
    ],
    [
        0x20fd191e, 0x55b06ec2, 0x2a63c465, 0x6f171a09, 0x03ca6fac, 0x587dc550, 0x2d311af3, 0x71e47097,
        0x1697c63a, 0x5b4b1bde, 0x2ffe7181, 0x64b1c725, 0x09651cc8, 0x4e18726c, 0x32cbc80f, 0x677f1db3,
        0x0c327356, 0x40e5c8fa, 0x35991e9d, 0x7a4c7441, 0x1effc9e4, 0x53b31f88, 0x2866752b, 0x6d19cacf,
    ],
    [
        0x01cd2072, 0x46807616, 0x3b33cbb9, 0x6fe7215d, 0x049a7700, 0x594dcca4, 0x2e012247, 0x62b477eb,
        0x1767cd8e, 0x5c1b2332, 0x30ce78d5, 0x6581ce79, 0x0a35241c, 0x3ee879c0, 0x339bcf63, 0x784f2507,
        0x1d027aaa, 0x51b5d04e, 0x266925f1, 0x6b1c7b95, 0x0fcfd138, 0x548326dc, 0x29367c7f, 0x5de9d223,
    ],
    [
        0x129d27c6, 0x4750636a, 0x3c03d90d, 0x70b72eb1, 0x056a8454, 0x5a1dd9f8, 0x2ed12f9b, 0x6384853f,
        0x1837dae2, 0x4ceb3086, 0x319e8629, 0x7651dbcd, 0x0b053170, 0x3fb88714, 0x3467dcb7, 0x791f325b,
        0x1dd287fe, 0x5285dda2, 0x27393345, 0x6bec88e9, 0x109fde8c, 0x45533430, 0x3a0689d3, 0x6eb9df77,
    ],
];

#[rustfmt::skip]
const RC24_INTERNAL: [u32; 23] = [
    0x356d3514, 0x6a208ab8, 0x0ed3e05b, 0x438735ff, 0x383a8ba3, 0x7cede146, 0x21a136e9, 0x56548c8d,
    0x2b07e230, 0x5fbb37d4, 0x146e8d77, 0x4921e31b, 0x3dd538be, 0x72888e62, 0x073be405, 0x3bef39a9,
    0x30a28f4c, 0x6555e4f0, 0x1a093a93, 0x4ebc9037, 0x236fe5da, 0x58233b7e, 0x0cd69121,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_canonical(table: &[u32]) {
        for &rc in table {
            assert!(rc < crate::field::Fp::ORDER_U32, "round constant {rc:#010x} not canonical");
        }
    }

    #[test]
    fn test_round_constants_are_canonical() {
        for round in RC16_INITIAL.iter().chain(RC16_TERMINAL.iter()) {
            assert_canonical(round);
        }
        for round in RC24_INITIAL.iter().chain(RC24_TERMINAL.iter()) {
            assert_canonical(round);
        }
        assert_canonical(&RC16_INTERNAL);
        assert_canonical(&RC24_INTERNAL);
    }

    #[test]
    fn test_diagonal_entries_are_distinct() {
        for table in [&DIAG16[..], &DIAG24[..]] {
            for (i, a) in table.iter().enumerate() {
                for b in &table[i + 1..] {
                    assert_ne!(a, b, "duplicate diagonal coefficient");
                }
            }
        }
        assert_eq!(DIAG16[0], DiagEntry::NegTwo);
        assert_eq!(DIAG24[0], DiagEntry::NegTwo);
    }
}
