//! BLAKE3 helpers for user-scoped keys.
//!
//! User identifiers are arbitrary strings supplied by the serving layer, so they
//! never reach the filesystem directly. [`user_storage_key`] maps them to a fixed
//! width hex name, and [`user_seed`] derives a per-user RNG seed so that a
//! configured global seed still gives every user an independent word order.

use blake3::Hasher;

/// Computes a 64-bit hash of `data` (first 8 bytes of the BLAKE3 digest).
///
/// Collisions only matter for [`user_seed`], where a collision means two users
/// share a selection order. Storage keys use the full digest.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

#[inline]
pub fn hash_user_id(user_id: &str) -> u64 {
    hash_to_u64(user_id.as_bytes())
}

/// Returns the 64-character hex file stem used to persist a user's records.
#[inline]
pub fn user_storage_key(user_id: &str) -> String {
    blake3::hash(user_id.as_bytes()).to_hex().to_string()
}

/// Mixes a global seed with the user id.
#[inline]
pub fn user_seed(seed: u64, user_id: &str) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(b"|");
    hasher.update(user_id.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}
