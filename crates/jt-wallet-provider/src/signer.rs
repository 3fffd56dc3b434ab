use crate::ProviderError;
use async_trait::async_trait;
use jt_types::{ChainId, WalletAddress};

/// Signing capability bound to one chain at creation. A signer for one
/// network is never valid for another.
#[async_trait(?Send)]
pub trait Signer {
    fn chain_id(&self) -> &ChainId;
    fn address(&self) -> &WalletAddress;
    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, ProviderError>;
}

#[cfg(feature = "memory")]
pub use local::LocalSigner;

#[cfg(feature = "memory")]
mod local {
    use super::*;
    use ed25519_dalek::{Signature, Signer as DalekSigner, SigningKey, Verifier};
    use rand::rngs::OsRng;
    use sha2::{Digest, Sha256};
    use zeroize::Zeroizing;

    /// ed25519 key held in process memory, bound to a single chain.
    pub struct LocalSigner {
        signing_key: SigningKey,
        chain_id: ChainId,
        address: WalletAddress,
    }

    impl LocalSigner {
        pub fn new_random(chain_id: ChainId, address_prefix: &str) -> Self {
            let mut rng = OsRng;
            let signing_key = SigningKey::generate(&mut rng);
            let address = derive_address(address_prefix, &signing_key);
            Self {
                signing_key,
                chain_id,
                address,
            }
        }

        pub fn from_secret_key_bytes(secret_key: [u8; 32], chain_id: ChainId, address_prefix: &str) -> Self {
            let signing_key = SigningKey::from_bytes(&secret_key);
            let address = derive_address(address_prefix, &signing_key);
            Self {
                signing_key,
                chain_id,
                address,
            }
        }

        /// Signer reporting an externally assigned address.
        pub fn with_address(secret_key: [u8; 32], chain_id: ChainId, address: WalletAddress) -> Self {
            Self {
                signing_key: SigningKey::from_bytes(&secret_key),
                chain_id,
                address,
            }
        }

        pub fn public_key_hex(&self) -> String {
            to_hex(&self.signing_key.verifying_key().to_bytes())
        }

        pub fn secret_key_bytes(&self) -> Zeroizing<[u8; 32]> {
            Zeroizing::new(self.signing_key.to_bytes())
        }

        pub fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
            let Ok(signature) = Signature::from_slice(signature) else {
                return false;
            };
            self.signing_key
                .verifying_key()
                .verify(&self.signing_input(payload), &signature)
                .is_ok()
        }

        fn signing_input(&self, payload: &[u8]) -> Vec<u8> {
            let chain = self.chain_id.0.as_bytes();
            let mut input = Vec::with_capacity(16 + chain.len() + payload.len());
            input.extend_from_slice(b"junotools:v1:");
            input.extend_from_slice(chain);
            input.extend_from_slice(b":");
            input.extend_from_slice(payload);
            input
        }
    }

    #[async_trait(?Send)]
    impl Signer for LocalSigner {
        fn chain_id(&self) -> &ChainId {
            &self.chain_id
        }

        fn address(&self) -> &WalletAddress {
            &self.address
        }

        async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, ProviderError> {
            if payload.is_empty() {
                return Err(ProviderError::Signing("payload cannot be empty".to_owned()));
            }

            let signature: Signature = self.signing_key.sign(&self.signing_input(payload));
            Ok(signature.to_bytes().to_vec())
        }
    }

    fn derive_address(prefix: &str, signing_key: &SigningKey) -> WalletAddress {
        let digest = Sha256::digest(signing_key.verifying_key().to_bytes());
        WalletAddress(format!("{prefix}1{}", to_hex(&digest[..19])))
    }

    fn to_hex(input: &[u8]) -> String {
        let mut output = String::with_capacity(input.len() * 2);
        for byte in input {
            output.push_str(&format!("{byte:02x}"));
        }
        output
    }

}
