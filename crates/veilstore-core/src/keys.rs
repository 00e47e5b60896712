//! Server signing keys
//!
//! This module owns the server's RSA signing key pair and its on-disk
//! lifecycle. Key material is PEM-encoded (PKCS#8 private, SPKI public)
//! and lives in a keys directory created with mode 0700; the private key
//! file is mode 0600, the public key file 0644 so it can be exported for
//! independent verification.
//!
//! Signing uses PSS padding with SHA-256 and blinding, so two signatures
//! over the same message differ bit-for-bit. Verifiers must therefore
//! check signature validity, never signature equality.
//!
//! Key types:
//! - `SigningKeyPair`: private + public halves, held in-process
//! - `PublicKey`: verification half, exportable as PEM
//! - `SigningKeyManager`: load-or-create against primary/fallback dirs

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rsa::pkcs8::{
    DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding,
};
use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tracing::{info, warn};

use crate::error::{CoreError, Result};

/// RSA modulus size for generated server keys
pub const KEY_BITS: usize = 3072;

/// File name of the PKCS#8 private key PEM
pub const PRIVATE_KEY_FILE: &str = "server_signing_key.pem";

/// File name of the SPKI public key PEM
pub const PUBLIC_KEY_FILE: &str = "server_signing_key.pub";

/// Why a signature was rejected during verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureRejection {
    /// The signature decodes but does not match the message under this key
    Mismatch,
    /// The stored signature bytes are not a decodable PSS signature
    Malformed(String),
}

impl std::fmt::Display for SignatureRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureRejection::Mismatch => write!(f, "signature does not match"),
            SignatureRejection::Malformed(msg) => write!(f, "malformed signature: {}", msg),
        }
    }
}

/// RSA public key for signature verification and export
#[derive(Clone)]
pub struct PublicKey {
    public: RsaPublicKey,
    verifying: VerifyingKey<Sha256>,
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey")
            .field("bits", &(self.public.size() * 8))
            .finish()
    }
}

impl PublicKey {
    fn new(public: RsaPublicKey) -> Self {
        let verifying = VerifyingKey::<Sha256>::new(public.clone());
        Self { public, verifying }
    }

    /// Parse a public key from SPKI PEM
    pub fn from_pem(pem: &str) -> Result<Self> {
        let public = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| CoreError::KeyFormat(e.to_string()))?;
        Ok(Self::new(public))
    }

    /// Export as SPKI PEM for third-party chain verification
    pub fn to_pem(&self) -> Result<String> {
        self.public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Check a PSS signature over `message`.
    ///
    /// A mismatch is an expected outcome and comes back as
    /// [`SignatureRejection::Mismatch`]; undecodable signature bytes are
    /// distinguished as [`SignatureRejection::Malformed`].
    pub fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
    ) -> std::result::Result<(), SignatureRejection> {
        if signature.len() != self.public.size() {
            return Err(SignatureRejection::Malformed(format!(
                "invalid signature length: {}, expected {}",
                signature.len(),
                self.public.size()
            )));
        }
        let signature = Signature::try_from(signature)
            .map_err(|e| SignatureRejection::Malformed(e.to_string()))?;
        self.verifying
            .verify(message, &signature)
            .map_err(|_| SignatureRejection::Mismatch)
    }
}

/// The server's signing key pair
#[derive(Clone)]
pub struct SigningKeyPair {
    private: RsaPrivateKey,
    signing: BlindedSigningKey<Sha256>,
    public: PublicKey,
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("private", &"[redacted]")
            .field("public", &self.public)
            .finish()
    }
}

impl SigningKeyPair {
    /// Generate a fresh pair at the production modulus size
    pub fn generate() -> Result<Self> {
        Self::generate_with_bits(KEY_BITS)
    }

    /// Generate with an explicit modulus size.
    ///
    /// Anything below [`KEY_BITS`] is acceptable only in tests.
    pub fn generate_with_bits(bits: usize) -> Result<Self> {
        let private = RsaPrivateKey::new(&mut OsRng, bits)?;
        Ok(Self::from_private(private))
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        let public = PublicKey::new(private.to_public_key());
        let signing = BlindedSigningKey::<Sha256>::new(private.clone());
        Self {
            private,
            signing,
            public,
        }
    }

    /// Parse a pair from a PKCS#8 private key PEM
    pub fn from_pem(pem: &str) -> Result<Self> {
        let private =
            RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| CoreError::KeyFormat(e.to_string()))?;
        Ok(Self::from_private(private))
    }

    /// Sign `message` with randomized PSS padding.
    ///
    /// Safe to call concurrently; repeated calls over identical input
    /// produce different, equally-valid signatures.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signature = self
            .signing
            .try_sign_with_rng(&mut OsRng, message)
            .map_err(|e| CoreError::Crypto(e.to_string()))?;
        Ok(signature.to_vec())
    }

    /// The verification half
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    fn private_pem(&self) -> Result<String> {
        let pem = self
            .private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        Ok(pem.to_string())
    }
}

/// Loads the server key pair from durable storage, generating and
/// persisting one on first boot.
///
/// The primary directory wins whenever it holds a key pair; the fallback
/// directory is only consulted when the primary cannot be written. No
/// other component touches key files directly.
#[derive(Debug, Clone)]
pub struct SigningKeyManager {
    primary_dir: PathBuf,
    fallback_dir: PathBuf,
    bits: usize,
}

impl SigningKeyManager {
    pub fn new(primary_dir: impl Into<PathBuf>, fallback_dir: impl Into<PathBuf>) -> Self {
        Self {
            primary_dir: primary_dir.into(),
            fallback_dir: fallback_dir.into(),
            bits: KEY_BITS,
        }
    }

    /// Override the modulus size for generated keys. Test-only escape
    /// hatch; production keys stay at [`KEY_BITS`].
    pub fn with_key_bits(mut self, bits: usize) -> Self {
        self.bits = bits;
        self
    }

    /// Load the stored key pair, or generate and persist a fresh one.
    ///
    /// Idempotent across process restarts. Fails with
    /// [`CoreError::KeyStorage`] when neither directory is writable and
    /// with [`CoreError::KeyFormat`] when stored material does not parse.
    pub fn load_or_create(&self) -> Result<SigningKeyPair> {
        if has_keypair(&self.primary_dir) {
            return load_from(&self.primary_dir);
        }

        match create_in(&self.primary_dir, self.bits) {
            Ok(pair) => Ok(pair),
            Err(CoreError::KeyStorage { path, source }) => {
                warn!(
                    primary = %path,
                    error = %source,
                    fallback = %self.fallback_dir.display(),
                    "Primary key directory not writable, using fallback"
                );
                if has_keypair(&self.fallback_dir) {
                    load_from(&self.fallback_dir)
                } else {
                    create_in(&self.fallback_dir, self.bits)
                }
            }
            Err(other) => Err(other),
        }
    }
}

fn has_keypair(dir: &Path) -> bool {
    dir.join(PRIVATE_KEY_FILE).is_file() && dir.join(PUBLIC_KEY_FILE).is_file()
}

fn load_from(dir: &Path) -> Result<SigningKeyPair> {
    let priv_path = dir.join(PRIVATE_KEY_FILE);
    let priv_pem = fs::read_to_string(&priv_path).map_err(|e| storage_err(&priv_path, e))?;
    let pair = SigningKeyPair::from_pem(&priv_pem)?;

    // The public file must at least parse; the private half is authoritative.
    let pub_path = dir.join(PUBLIC_KEY_FILE);
    let pub_pem = fs::read_to_string(&pub_path).map_err(|e| storage_err(&pub_path, e))?;
    PublicKey::from_pem(&pub_pem)?;

    info!(dir = %dir.display(), "Loaded server signing key");
    Ok(pair)
}

fn create_in(dir: &Path, bits: usize) -> Result<SigningKeyPair> {
    fs::create_dir_all(dir).map_err(|e| storage_err(dir, e))?;
    set_mode(dir, 0o700).map_err(|e| storage_err(dir, e))?;

    let pair = SigningKeyPair::generate_with_bits(bits)?;

    let priv_path = dir.join(PRIVATE_KEY_FILE);
    write_with_mode(&priv_path, pair.private_pem()?.as_bytes(), 0o600)?;

    let pub_path = dir.join(PUBLIC_KEY_FILE);
    write_with_mode(&pub_path, pair.public.to_pem()?.as_bytes(), 0o644)?;

    info!(dir = %dir.display(), bits, "Generated and persisted server signing key");
    Ok(pair)
}

fn write_with_mode(path: &Path, data: &[u8], mode: u32) -> Result<()> {
    fs::write(path, data).map_err(|e| storage_err(path, e))?;
    set_mode(path, mode).map_err(|e| storage_err(path, e))?;
    Ok(())
}

fn storage_err(path: &Path, source: std::io::Error) -> CoreError {
    CoreError::KeyStorage {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
