use crate::{
    MESSAGE_LENGTH,
    symmetric::message_hash::{MessageHash, bytes_to_chunks},
};

use super::IncomparableEncoding;

/// Incomparable Encoding Scheme based on the basic Winternitz scheme, implemented from a given message hash.
/// CHUNK_SIZE must be 1, 2, 4, or 8 and MH::BASE must be 2^CHUNK_SIZE.
/// NUM_CHUNKS_CHECKSUM is the precomputed number of checksum chunks (see original Winternitz description).
pub struct WinternitzEncoding<
    MH: MessageHash,
    const CHUNK_SIZE: usize,
    const NUM_CHUNKS_CHECKSUM: usize,
> {
    _marker_mh: std::marker::PhantomData<MH>,
}

impl<MH: MessageHash, const CHUNK_SIZE: usize, const NUM_CHUNKS_CHECKSUM: usize>
    IncomparableEncoding for WinternitzEncoding<MH, CHUNK_SIZE, NUM_CHUNKS_CHECKSUM>
{
    type Parameter = MH::Parameter;

    type Randomness = MH::Randomness;

    type Error = ();

    const DIMENSION: usize = MH::DIMENSION + NUM_CHUNKS_CHECKSUM;

    const MAX_TRIES: usize = 1;

    const BASE: usize = MH::BASE;

    fn rand<R: rand::Rng>(rng: &mut R) -> Self::Randomness {
        MH::rand(rng)
    }

    fn encode(
        parameter: &Self::Parameter,
        message: &[u8; MESSAGE_LENGTH],
        randomness: &Self::Randomness,
        epoch: u32,
    ) -> Result<Vec<u8>, Self::Error> {
        // apply the message hash to get chunks
        let mut chunks_message = MH::apply(parameter, epoch, randomness, message);

        // compute checksum and split into chunks in little endian
        let checksum: u64 = chunks_message
            .iter()
            .map(|&x| Self::BASE as u64 - 1 - x as u64)
            .sum();
        let checksum_bytes = checksum.to_le_bytes();
        let chunks_checksum = bytes_to_chunks(&checksum_bytes, CHUNK_SIZE);

        // append checksum chunks (truncate to the expected number)
        chunks_message.extend_from_slice(&chunks_checksum[..NUM_CHUNKS_CHECKSUM]);

        Ok(chunks_message)
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        assert!(
            [1, 2, 4, 8].contains(&CHUNK_SIZE),
            "Winternitz Encoding: Chunk Size must be 1, 2, 4, or 8"
        );
        assert!(
            Self::DIMENSION <= 1 << 8,
            "Winternitz Encoding: Dimension must be at most 2^8"
        );
        assert!(
            MH::BASE == Self::BASE && MH::BASE == 1 << CHUNK_SIZE,
            "Winternitz Encoding: Base and chunk size not consistent with message hash"
        );
        assert!(
            NUM_CHUNKS_CHECKSUM > 0,
            "Winternitz Encoding: Checksum must have at least one chunk"
        );

        MH::internal_consistency_check();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::FieldArray;
    use crate::symmetric::message_hash::poseidon::PoseidonMessageHash44;
    use rand::Rng;

    // base 4 = 2^2, 32 message chunks, checksum of 32 * 3 = 96 at most,
    // which needs 4 chunks of 2 bits
    type TestWinternitz = WinternitzEncoding<PoseidonMessageHash44, 2, 4>;

    #[test]
    fn test_internal_consistency() {
        TestWinternitz::internal_consistency_check();
    }

    #[test]
    fn test_encode_never_fails_and_checksum_is_consistent() {
        let mut rng = rand::rng();
        let parameter: FieldArray<4> = FieldArray(rng.random());
        let message: [u8; 32] = rng.random();
        let randomness = TestWinternitz::rand(&mut rng);

        let chunks = TestWinternitz::encode(&parameter, &message, &randomness, 7)
            .expect("Winternitz encoding is retry-free");

        assert_eq!(chunks.len(), TestWinternitz::DIMENSION);
        for &chunk in &chunks {
            assert!((chunk as usize) < TestWinternitz::BASE);
        }

        // recompute the checksum from the message part
        let message_part = &chunks[..PoseidonMessageHash44::DIMENSION];
        let checksum: u64 = message_part
            .iter()
            .map(|&x| TestWinternitz::BASE as u64 - 1 - x as u64)
            .sum();
        let expected = bytes_to_chunks(&checksum.to_le_bytes(), 2);
        assert_eq!(&chunks[PoseidonMessageHash44::DIMENSION..], &expected[..4]);
    }

    #[test]
    fn test_incomparability_on_checksum() {
        // increasing a message chunk strictly decreases the checksum, so two
        // codewords can never be component-wise ordered. We check the
        // checksum direction on two encodings of different messages.
        let mut rng = rand::rng();
        let parameter: FieldArray<4> = FieldArray(rng.random());
        let randomness = TestWinternitz::rand(&mut rng);

        let m1: [u8; 32] = rng.random();
        let m2: [u8; 32] = rng.random();
        let c1 = TestWinternitz::encode(&parameter, &m1, &randomness, 0).unwrap();
        let c2 = TestWinternitz::encode(&parameter, &m2, &randomness, 0).unwrap();

        let sum = |c: &[u8]| -> u64 {
            c[..PoseidonMessageHash44::DIMENSION]
                .iter()
                .map(|&x| u64::from(x))
                .sum()
        };
        let checksum = |c: &[u8]| -> u64 {
            c[PoseidonMessageHash44::DIMENSION..]
                .iter()
                .enumerate()
                .map(|(i, &x)| u64::from(x) << (2 * i))
                .sum()
        };

        // checksum encodes BASE-1-x summed over message chunks
        let max_sum = (PoseidonMessageHash44::DIMENSION * (TestWinternitz::BASE - 1)) as u64;
        assert_eq!(sum(&c1) + checksum(&c1), max_sum);
        assert_eq!(sum(&c2) + checksum(&c2), max_sum);
    }
}
