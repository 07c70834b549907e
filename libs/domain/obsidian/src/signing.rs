// [libs/domain/obsidian/src/signing.rs]
//! Signs Merkle roots and evidence packages. HMAC-SHA256 keeps the
//! dependency surface small; deployments that need asymmetric
//! signatures swap the key material behind the same `sign`/`verify`
//! shape without touching the sealing or evidence call sites.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct LedgerSigner {
    key: Vec<u8>,
}

impl LedgerSigner {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    pub fn sign(&self, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn verify(&self, message: &str, signature: &str) -> bool {
        self.sign(message) == signature
    }
}
