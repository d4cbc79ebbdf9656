//! Client-side encrypted inputs.
//!
//! An input proof carries the values it covers together with the contract
//! and user it was produced for. The coprocessor only accepts a handle when
//! the proof is intact, names the calling contract and user, and lists the
//! handle.

use fleet_core::{Address, FheType, Handle, InputProof};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{FheError, Result};

const PROOF_DOMAIN: &[u8] = b"fleet.fhe.input-proof.v1";
const HANDLE_DOMAIN: &[u8] = b"fleet.fhe.input-handle.v1";

/// Handles plus the proof to pass alongside them in a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handles: Vec<Handle>,
    pub input_proof: InputProof,
}

/// Accumulates values to encrypt for a `(contract, user)` pair.
#[derive(Debug, Clone)]
pub struct EncryptedInputBuilder {
    contract: Address,
    user: Address,
    values: Vec<(FheType, u64)>,
}

impl EncryptedInputBuilder {
    pub fn new(contract: Address, user: Address) -> Self {
        Self {
            contract,
            user,
            values: Vec::new(),
        }
    }

    pub fn add32(&mut self, value: u32) -> &mut Self {
        self.values.push((FheType::Uint32, u64::from(value)));
        self
    }

    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.values.push((FheType::Bool, u64::from(value)));
        self
    }

    pub fn encrypt(&self) -> Result<EncryptedInput> {
        if self.values.is_empty() {
            return Err(FheError::EmptyInput);
        }

        let body = ProofBody {
            contract: self.contract,
            user: self.user,
            salt: rand::random(),
            values: self.values.clone(),
        };
        let digest = body.digest()?;
        let handles = body.handles_for(&digest);

        let envelope = ProofEnvelope { body, digest };
        let bytes =
            bincode::serialize(&envelope).map_err(|e| FheError::Serialization(e.to_string()))?;

        Ok(EncryptedInput {
            handles,
            input_proof: InputProof::new(bytes),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProofBody {
    pub contract: Address,
    pub user: Address,
    salt: [u8; 16],
    pub values: Vec<(FheType, u64)>,
}

impl ProofBody {
    fn digest(&self) -> Result<[u8; 32]> {
        let encoded =
            bincode::serialize(self).map_err(|e| FheError::Serialization(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(PROOF_DOMAIN);
        hasher.update(&encoded);
        Ok(hasher.finalize().into())
    }

    fn handles_for(&self, digest: &[u8; 32]) -> Vec<Handle> {
        self.values
            .iter()
            .enumerate()
            .map(|(index, (ty, _))| {
                let mut hasher = Sha256::new();
                hasher.update(HANDLE_DOMAIN);
                hasher.update(digest);
                hasher.update((index as u32).to_be_bytes());
                let mut bytes: [u8; 32] = hasher.finalize().into();
                bytes[Handle::TYPE_BYTE] = ty.tag();
                bytes[Handle::VERSION_BYTE] = Handle::VERSION;
                Handle::from_bytes(bytes)
            })
            .collect()
    }
}

#[derive(Serialize, Deserialize)]
struct ProofEnvelope {
    body: ProofBody,
    digest: [u8; 32],
}

/// Proof contents after the integrity check, with the handles it covers.
pub(crate) struct VerifiedProof {
    pub body: ProofBody,
    pub handles: Vec<Handle>,
}

/// Decodes a proof and checks that its digest matches its contents.
pub(crate) fn open_proof(proof: &InputProof) -> std::result::Result<VerifiedProof, String> {
    let envelope: ProofEnvelope =
        bincode::deserialize(proof.as_bytes()).map_err(|e| format!("malformed proof: {e}"))?;

    let digest = envelope.body.digest().map_err(|e| e.to_string())?;
    if digest != envelope.digest {
        return Err("proof digest does not match its contents".to_string());
    }

    let handles = envelope.body.handles_for(&digest);
    Ok(VerifiedProof {
        body: envelope.body,
        handles,
    })
}
