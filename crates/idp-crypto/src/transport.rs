//! # Witness Transport Encryption
//!
//! Seals a serialized witness for a single receiver holding a static X25519
//! key. Each message carries everything needed to open it except the
//! receiver's private key; there is no handshake and no session state.
//!
//! ## Construction
//!
//! 1. The sender draws a fresh ephemeral X25519 key pair per message.
//! 2. `shared = X25519(ephemeral_secret, receiver_public)`.
//! 3. `key = BLAKE2s-256-MAC(key = shared, "idp-witness-transport-v1" || ephemeral_public || receiver_public)`.
//! 4. A random 24-byte nonce is drawn and the JSON-serialized witness is
//!    encrypted with XChaCha20-Poly1305.
//! 5. The output is `{ciphertext, nonce, ephemeralPublicKey}`, hex encoded.
//!
//! ## Security Invariant
//!
//! Opening fails closed. Malformed hex, wrong lengths, a low-order ephemeral
//! key, and tag failure all return [`TransportError`] and never any part of
//! the plaintext. Derived keys and plaintext buffers are zeroized on drop.

use blake2::digest::{KeyInit as MacKeyInit, Mac};
use blake2::Blake2sMac256;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::Zeroizing;

/// Context string binding derived keys to this channel and version.
pub const KDF_CONTEXT: &[u8] = b"idp-witness-transport-v1";

/// XChaCha20-Poly1305 nonce length.
pub const NONCE_LEN: usize = 24;

/// X25519 key length.
pub const KEY_LEN: usize = 32;

/// Poly1305 tag length.
const TAG_LEN: usize = 16;

/// Failures while sealing or opening a witness.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// A field of the sealed envelope could not be decoded.
    #[error("malformed {field}: {reason}")]
    Malformed {
        /// Envelope field name.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The key exchange produced an all-zero shared secret.
    #[error("ephemeral public key is not contributory")]
    NonContributory,

    /// Authentication failed: wrong key, tampered or truncated ciphertext.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The plaintext could not be encrypted.
    #[error("encryption failed")]
    EncryptionFailed,

    /// Payload (de)serialization failed.
    #[error("payload serialization failed: {0}")]
    Serialization(String),

    /// Key material could not be parsed.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Receiver's X25519 public key. Serializes as 64 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportPublicKey([u8; KEY_LEN]);

impl TransportPublicKey {
    /// Wrap raw public key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from 64 hex digits.
    pub fn from_hex(s: &str) -> Result<Self, TransportError> {
        decode_fixed::<KEY_LEN>(s.trim(), "public key").map(Self)
    }
}

impl Serialize for TransportPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TransportPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for TransportPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TransportPublicKey({}...)", &self.to_hex()[..16])
    }
}

impl std::fmt::Display for TransportPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Receiver's static key pair.
///
/// Does not implement `Serialize`; the private half is only reachable
/// through [`TransportKeyPair::secret_hex`] for key provisioning.
pub struct TransportKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl TransportKeyPair {
    /// Generate a new key pair from the OS RNG.
    pub fn generate() -> Self {
        Self::from_secret(StaticSecret::random_from_rng(OsRng))
    }

    /// Rebuild a key pair from its 32-byte private key.
    pub fn from_secret_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self::from_secret(StaticSecret::from(bytes))
    }

    /// Parse a hex-encoded private key.
    pub fn from_secret_hex(s: &str) -> Result<Self, TransportError> {
        let bytes = Zeroizing::new(
            decode_fixed::<KEY_LEN>(s.trim(), "private key")
                .map_err(|e| TransportError::InvalidKey(e.to_string()))?,
        );
        Ok(Self::from_secret_bytes(*bytes))
    }

    fn from_secret(secret: StaticSecret) -> Self {
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The public half, for distribution to senders.
    pub fn public_key(&self) -> TransportPublicKey {
        TransportPublicKey(self.public.to_bytes())
    }

    /// Hex-encoded private key, for writing into secret configuration.
    pub fn secret_hex(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.secret.to_bytes());
        Zeroizing::new(hex::encode(*bytes))
    }
}

impl std::fmt::Debug for TransportKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportKeyPair")
            .field("public", &self.public_key())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A sealed witness as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedWitness {
    /// Hex-encoded ciphertext with the Poly1305 tag appended.
    pub ciphertext: String,
    /// Hex-encoded 24-byte nonce.
    pub nonce: String,
    /// Hex-encoded sender ephemeral public key.
    pub ephemeral_public_key: String,
}

/// Serialize `payload` as JSON and seal it for `receiver`.
pub fn seal<T: Serialize>(
    payload: &T,
    receiver: &TransportPublicKey,
) -> Result<SealedWitness, TransportError> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(payload).map_err(|e| TransportError::Serialization(e.to_string()))?,
    );

    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral);
    let receiver_public = PublicKey::from(receiver.0);
    let shared = ephemeral.diffie_hellman(&receiver_public);
    if !shared.was_contributory() {
        return Err(TransportError::NonContributory);
    }

    let key = derive_key(shared.as_bytes(), ephemeral_public.as_bytes(), receiver.as_bytes())?;
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|_| TransportError::EncryptionFailed)?;

    tracing::debug!(
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        "witness sealed"
    );

    Ok(SealedWitness {
        ciphertext: hex::encode(ciphertext),
        nonce: hex::encode(nonce),
        ephemeral_public_key: hex::encode(ephemeral_public.as_bytes()),
    })
}

/// Open a sealed witness with the receiver's static key and deserialize it.
pub fn open<T: DeserializeOwned>(
    sealed: &SealedWitness,
    receiver: &TransportKeyPair,
) -> Result<T, TransportError> {
    let plaintext = open_bytes(sealed, receiver)?;
    serde_json::from_slice(&plaintext).map_err(|e| TransportError::Serialization(e.to_string()))
}

/// Open a sealed witness, returning the raw JSON plaintext.
pub fn open_bytes(
    sealed: &SealedWitness,
    receiver: &TransportKeyPair,
) -> Result<Zeroizing<Vec<u8>>, TransportError> {
    let ephemeral_bytes =
        decode_fixed::<KEY_LEN>(&sealed.ephemeral_public_key, "ephemeralPublicKey")?;
    let nonce = decode_fixed::<NONCE_LEN>(&sealed.nonce, "nonce")?;
    let ciphertext = hex::decode(&sealed.ciphertext).map_err(|e| TransportError::Malformed {
        field: "ciphertext",
        reason: e.to_string(),
    })?;
    if ciphertext.len() < TAG_LEN {
        return Err(TransportError::Malformed {
            field: "ciphertext",
            reason: format!("{} bytes is shorter than the authentication tag", ciphertext.len()),
        });
    }

    let ephemeral_public = PublicKey::from(ephemeral_bytes);
    let shared = receiver.secret.diffie_hellman(&ephemeral_public);
    if !shared.was_contributory() {
        return Err(TransportError::NonContributory);
    }

    let key = derive_key(shared.as_bytes(), &ephemeral_bytes, receiver.public.as_bytes())?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    let plaintext = cipher
        .decrypt(XNonce::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|_| TransportError::DecryptionFailed)?;

    tracing::debug!(plaintext_len = plaintext.len(), "witness opened");
    Ok(Zeroizing::new(plaintext))
}

fn derive_key(
    shared: &[u8; KEY_LEN],
    ephemeral_public: &[u8; KEY_LEN],
    receiver_public: &[u8; KEY_LEN],
) -> Result<Zeroizing<[u8; KEY_LEN]>, TransportError> {
    let mut mac = <Blake2sMac256 as MacKeyInit>::new_from_slice(shared)
        .map_err(|e| TransportError::InvalidKey(e.to_string()))?;
    mac.update(KDF_CONTEXT);
    mac.update(ephemeral_public);
    mac.update(receiver_public);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&mac.finalize().into_bytes());
    Ok(key)
}

fn decode_fixed<const N: usize>(s: &str, field: &'static str) -> Result<[u8; N], TransportError> {
    let mut out = [0u8; N];
    hex::decode_to_slice(s, &mut out).map_err(|e| TransportError::Malformed {
        field,
        reason: e.to_string(),
    })?;
    Ok(out)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn sealed_payload_opens_only_for_its_receiver(
            payload in prop::collection::btree_map("[a-z_]{1,12}", any::<u64>(), 0..8)
        ) {
            let receiver = TransportKeyPair::generate();
            let sealed = seal(&payload, &receiver.public_key()).unwrap();
            let opened: BTreeMap<String, u64> = open(&sealed, &receiver).unwrap();
            prop_assert_eq!(opened, payload);

            let other = TransportKeyPair::generate();
            prop_assert_eq!(
                open::<BTreeMap<String, u64>>(&sealed, &other),
                Err(TransportError::DecryptionFailed)
            );
        }

        #[test]
        fn any_flipped_ciphertext_byte_fails_closed(
            payload in "[ -~]{0,64}",
            position in any::<prop::sample::Index>(),
            mask in 1u8..=255,
        ) {
            let receiver = TransportKeyPair::generate();
            let mut sealed = seal(&payload, &receiver.public_key()).unwrap();
            let mut bytes = hex::decode(&sealed.ciphertext).unwrap();
            let at = position.index(bytes.len());
            bytes[at] ^= mask;
            sealed.ciphertext = hex::encode(bytes);
            prop_assert_eq!(
                open::<String>(&sealed, &receiver),
                Err(TransportError::DecryptionFailed)
            );
        }
    }
}
