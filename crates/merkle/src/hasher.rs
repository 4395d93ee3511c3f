use digest::{consts::U32, Digest};

/// 32 byte hash.
pub type Hash32 = [u8; 32];

/// Generic merkle hashing trait.
///
/// Leaves and internal nodes use the same hash function; there is no domain
/// separation between the two.
pub trait MerkleHasher {
    /// Hashes raw leaf data.
    fn hash_leaf(data: &[u8]) -> Hash32;

    /// Combines the left and right nodes to form their parent.
    fn hash_node(left: &Hash32, right: &Hash32) -> Hash32;
}

/// Generic impl over [`Digest`] impls with a 32 byte output.
impl<D: Digest<OutputSize = U32>> MerkleHasher for D {
    fn hash_leaf(data: &[u8]) -> Hash32 {
        D::digest(data).into()
    }

    fn hash_node(left: &Hash32, right: &Hash32) -> Hash32 {
        let mut context = D::new();
        context.update(left);
        context.update(right);
        context.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use sha2::Sha256;

    use super::*;

    #[test]
    fn test_sha256_leaf() {
        let leaf = <Sha256 as MerkleHasher>::hash_leaf(b"a");
        assert_eq!(
            hex::encode(leaf),
            "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb"
        );
    }

    #[test]
    fn test_node_is_hash_of_concatenation() {
        let left = [1u8; 32];
        let right = [2u8; 32];
        let mut concat = Vec::with_capacity(64);
        concat.extend_from_slice(&left);
        concat.extend_from_slice(&right);

        let expected: Hash32 = Sha256::digest(&concat).into();
        assert_eq!(<Sha256 as MerkleHasher>::hash_node(&left, &right), expected);
        assert_ne!(<Sha256 as MerkleHasher>::hash_node(&right, &left), expected);
    }
}
