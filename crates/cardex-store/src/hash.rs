//! Blake3 hashing for store paths

/// Hash raw bytes with blake3.
pub fn hash_bytes(data: &[u8]) -> blake3::Hash {
    blake3::hash(data)
}

/// Return the first 8 hex characters of a blake3 hash.
pub fn short_hash(hash: &blake3::Hash) -> String {
    hash.to_hex()[..8].to_string()
}

/// Filesystem-safe name for an arbitrary key.
///
/// Keys such as trigrams may contain `/`, `.` or whitespace; the full hex
/// digest keeps distinct keys on distinct paths.
pub fn key_file_name(key: &str) -> String {
    hash_bytes(key.as_bytes()).to_hex().to_string()
}

/// Short bucket name for a partition key.
pub fn partition_dir_name(partition_key: &str) -> String {
    short_hash(&hash_bytes(partition_key.as_bytes()))
}
