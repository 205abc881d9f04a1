use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

/// Lowercase hex digests of one input across the supported algorithms,
/// keyed on the wire by the algorithm's uppercase name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hashes {
    #[serde(rename = "SHA1")]
    pub sha1: String,
    #[serde(rename = "SHA256")]
    pub sha256: String,
    #[serde(rename = "SHA512")]
    pub sha512: String,
    #[serde(rename = "MD5")]
    pub md5: String,
}

pub fn generate_hashes(text: &str) -> Hashes {
    Hashes {
        sha1: format!("{:x}", Sha1::digest(text.as_bytes())),
        sha256: format!("{:x}", Sha256::digest(text.as_bytes())),
        sha512: format!("{:x}", Sha512::digest(text.as_bytes())),
        md5: format!("{:x}", md5::compute(text.as_bytes())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors_for_abc() {
        let hashes = generate_hashes("abc");
        assert_eq!(hashes.sha1, "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(
            hashes.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            hashes.sha512,
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
        assert_eq!(hashes.md5, "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn empty_input_hashes_to_the_empty_digests() {
        let hashes = generate_hashes("");
        assert_eq!(hashes.md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            hashes.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn serializes_with_uppercase_algorithm_names() {
        let json = serde_json::to_value(generate_hashes("x")).unwrap();
        assert!(json.get("SHA1").is_some());
        assert!(json.get("SHA256").is_some());
        assert!(json.get("SHA512").is_some());
        assert!(json.get("MD5").is_some());
    }
}
