use crate::error::DecodeError;
use crate::generators::Generators;
use crate::oracle::Oracle;
use crate::point::{mul_point, MulMode, PointRepr};
use crate::secret::SecString;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::Scalar;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

/// Purpose discriminator in a key derivation path.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct KeyType(pub u32);

impl KeyType {
    pub const REGULAR: KeyType = KeyType(1);
    pub const COINBASE: KeyType = KeyType(2);
    pub const KERNEL: KeyType = KeyType(3);
    pub const TREASURY: KeyType = KeyType(4);
    pub const CHANGE: KeyType = KeyType(5);
}

/// Key identity plus value: (index, type, sub-index) select a derivation
/// path, `value` is the amount the derived key commits to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct KeyIdv {
    pub idx: u64,
    pub key_type: KeyType,
    pub sub_idx: u32,
    pub value: u64,
}

impl KeyIdv {
    pub fn new(idx: u64, sub_idx: u32, key_type: KeyType, value: u64) -> Self {
        KeyIdv { idx, key_type, sub_idx, value }
    }

    /// Child selector for this path.
    pub fn to_hash(&self) -> [u8; 32] {
        Oracle::new()
            .feed(b"kidv")
            .feed_u64(self.idx)
            .feed_u32(self.key_type.0)
            .feed_u32(self.sub_idx)
            .feed_u64(self.value)
            .draw()
    }
}

/// Public half of the derivation interface: child scalars and points that
/// never reveal private material.
pub trait PublicKdf {
    fn derive_public_scalar(&self, hv: &[u8; 32]) -> Scalar;
    fn derive_point_g(&self, gens: &Generators, hv: &[u8; 32]) -> RistrettoPoint;
    fn derive_point_j(&self, gens: &Generators, hv: &[u8; 32]) -> RistrettoPoint;
}

/// Full derivation interface, including private child keys.
pub trait Kdf: PublicKdf {
    fn derive_secret(&self, hv: &[u8; 32]) -> Zeroizing<Scalar>;
}

/// Deterministic master key context.
///
/// A child key is `h(secret, hv) · cofactor`; the public variant derives
/// `h(secret, hv)` alone, so the two stay related by the master discrete log
/// without the public side ever learning it.
pub struct HKdf {
    secret: Zeroizing<[u8; 32]>,
    cofactor: Zeroizing<Scalar>,
}

impl HKdf {
    pub fn generate(seed: &[u8; 32]) -> Self {
        let secret = Zeroizing::new(Oracle::new().feed(b"kdf.gen").feed(seed).draw());
        let cofactor = Zeroizing::new(Oracle::new().feed(b"kdf.coF").feed(seed).draw_scalar());
        HKdf { secret, cofactor }
    }

    fn child(&self, hv: &[u8; 32]) -> Scalar {
        Oracle::new().feed(b"kdf.child").feed(&*self.secret).feed(hv).draw_scalar()
    }

    /// Context equality without exhaustive derivation checks.
    pub fn is_same(&self, other: &HKdf) -> bool {
        let secrets = self.secret.ct_eq(&*other.secret);
        let cofactors = self.cofactor.as_bytes().ct_eq(other.cofactor.as_bytes());
        bool::from(secrets & cofactors)
    }

    fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(64));
        bytes.extend_from_slice(&*self.secret);
        bytes.extend_from_slice(self.cofactor.as_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != 64 {
            return Err(DecodeError::NonCanonicalScalar);
        }
        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&bytes[..32]);
        let mut cof = [0u8; 32];
        cof.copy_from_slice(&bytes[32..]);
        let cofactor = Scalar::from_canonical_bytes(cof)
            .into_option()
            .ok_or(DecodeError::NonCanonicalScalar)?;
        Ok(HKdf { secret, cofactor: Zeroizing::new(cofactor) })
    }
}

impl PublicKdf for HKdf {
    fn derive_public_scalar(&self, hv: &[u8; 32]) -> Scalar {
        self.child(hv)
    }

    fn derive_point_g(&self, gens: &Generators, hv: &[u8; 32]) -> RistrettoPoint {
        mul_point(gens.g(), &self.derive_secret(hv), MulMode::Secure)
    }

    fn derive_point_j(&self, gens: &Generators, hv: &[u8; 32]) -> RistrettoPoint {
        mul_point(gens.j(), &self.derive_secret(hv), MulMode::Secure)
    }
}

impl Kdf for HKdf {
    fn derive_secret(&self, hv: &[u8; 32]) -> Zeroizing<Scalar> {
        Zeroizing::new(self.child(hv) * *self.cofactor)
    }
}

/// Public-only derivation context, exported one-way from an [`HKdf`].
///
/// Holds `cofactor·G` and `cofactor·J` instead of the cofactor itself; its
/// point derivations match the private context's for every index, while the
/// private child scalars stay out of reach.
pub struct HKdfPub {
    secret: Zeroizing<[u8; 32]>,
    pk_g: RistrettoPoint,
    pk_j: RistrettoPoint,
}

impl HKdfPub {
    pub fn from_kdf(gens: &Generators, kdf: &HKdf) -> Self {
        HKdfPub {
            secret: kdf.secret.clone(),
            pk_g: gens.g() * &*kdf.cofactor,
            pk_j: gens.j() * &*kdf.cofactor,
        }
    }

    fn child(&self, hv: &[u8; 32]) -> Scalar {
        Oracle::new().feed(b"kdf.child").feed(&*self.secret).feed(hv).draw_scalar()
    }

    pub fn is_same(&self, other: &HKdfPub) -> bool {
        let secrets = bool::from(self.secret.ct_eq(&*other.secret));
        secrets && self.pk_g == other.pk_g && self.pk_j == other.pk_j
    }

    fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(96));
        bytes.extend_from_slice(&*self.secret);
        bytes.extend_from_slice(PointRepr::export(&self.pk_g).as_bytes());
        bytes.extend_from_slice(PointRepr::export(&self.pk_j).as_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != 96 {
            return Err(DecodeError::InvalidPoint);
        }
        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&bytes[..32]);
        let mut pg = [0u8; 32];
        pg.copy_from_slice(&bytes[32..64]);
        let mut pj = [0u8; 32];
        pj.copy_from_slice(&bytes[64..]);
        Ok(HKdfPub {
            secret,
            pk_g: PointRepr::from_bytes(pg).import()?,
            pk_j: PointRepr::from_bytes(pj).import()?,
        })
    }
}

impl PublicKdf for HKdfPub {
    fn derive_public_scalar(&self, hv: &[u8; 32]) -> Scalar {
        self.child(hv)
    }

    fn derive_point_g(&self, _gens: &Generators, hv: &[u8; 32]) -> RistrettoPoint {
        mul_point(&self.pk_g, &self.child(hv), MulMode::Secure)
    }

    fn derive_point_j(&self, _gens: &Generators, hv: &[u8; 32]) -> RistrettoPoint {
        mul_point(&self.pk_j, &self.child(hv), MulMode::Secure)
    }
}

#[derive(Debug, Error)]
pub enum KeyStringError {
    #[error("wrong password or corrupted key data")]
    BadPassword,
    #[error("malformed key blob")]
    Malformed,
}

const TAG_SECRET: u8 = b'S';
const TAG_PUBLIC: u8 = b'P';

/// Password-protected export/import of a derivation context, with an
/// attached metadata string that travels inside the encrypted blob.
#[derive(Default)]
pub struct KeyString {
    password: SecString,
    pub meta: String,
    pub data: String,
}

impl KeyString {
    pub fn new() -> Self {
        KeyString::default()
    }

    pub fn set_password(&mut self, password: SecString) {
        self.password = password;
    }

    pub fn export_secret(&mut self, kdf: &HKdf) {
        self.data = self.seal(TAG_SECRET, &kdf.to_bytes());
    }

    pub fn export_public(&mut self, kdf: &HKdfPub) {
        self.data = self.seal(TAG_PUBLIC, &kdf.to_bytes());
    }

    pub fn import_secret(&mut self) -> Result<HKdf, KeyStringError> {
        let payload = self.open(TAG_SECRET)?;
        HKdf::from_bytes(&payload).map_err(|_| KeyStringError::Malformed)
    }

    pub fn import_public(&mut self) -> Result<HKdfPub, KeyStringError> {
        let payload = self.open(TAG_PUBLIC)?;
        HKdfPub::from_bytes(&payload).map_err(|_| KeyStringError::Malformed)
    }

    fn cipher_key(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(Oracle::new().feed(b"ks.aes").feed(self.password.as_bytes()).draw())
    }

    fn seal(&self, tag: u8, payload: &[u8]) -> String {
        let mut plaintext = Zeroizing::new(Vec::with_capacity(5 + payload.len() + self.meta.len()));
        plaintext.push(tag);
        plaintext.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        plaintext.extend_from_slice(payload);
        plaintext.extend_from_slice(self.meta.as_bytes());

        let key = self.cipher_key();
        let cipher = Aes256Gcm::new(key.as_ref().into());
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, plaintext.as_slice())
            .expect("AES-GCM encryption of an in-memory buffer cannot fail");

        let mut blob = Vec::with_capacity(nonce.len() + sealed.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);
        hex::encode(blob)
    }

    /// Decrypt the blob; restores the metadata string on success.
    fn open(&mut self, expected_tag: u8) -> Result<Zeroizing<Vec<u8>>, KeyStringError> {
        let blob = hex::decode(&self.data).map_err(|_| KeyStringError::Malformed)?;
        if blob.len() < 12 {
            return Err(KeyStringError::Malformed);
        }
        let (nonce, sealed) = blob.split_at(12);

        let key = self.cipher_key();
        let cipher = Aes256Gcm::new(key.as_ref().into());
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(nonce), sealed)
                .map_err(|_| KeyStringError::BadPassword)?,
        );

        if plaintext.len() < 5 || plaintext[0] != expected_tag {
            return Err(KeyStringError::Malformed);
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&plaintext[1..5]);
        let payload_len = u32::from_be_bytes(len_bytes) as usize;
        if plaintext.len() < 5 + payload_len {
            return Err(KeyStringError::Malformed);
        }
        let payload = Zeroizing::new(plaintext[5..5 + payload_len].to_vec());
        self.meta = String::from_utf8(plaintext[5 + payload_len..].to_vec())
            .map_err(|_| KeyStringError::Malformed)?;
        Ok(payload)
    }
}
