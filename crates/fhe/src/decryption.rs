//! User decryption against a signed grant.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use fleet_core::{Address, FheEnv, FheType, Handle};
use serde::{Deserialize, Serialize};

use crate::coprocessor::MockCoprocessor;
use crate::error::{FheError, Result};
use crate::grant::{DecryptionGrant, GrantStatus};

/// Decrypted value of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearValue {
    Bool(bool),
    Uint32(u32),
}

impl ClearValue {
    pub fn fhe_type(&self) -> FheType {
        match self {
            Self::Bool(_) => FheType::Bool,
            Self::Uint32(_) => FheType::Uint32,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Uint32(_) => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Uint32(value) => Some(*value),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for ClearValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Uint32(value) => write!(f, "{value}"),
        }
    }
}

/// Everything the relayer forwards for one decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDecryptRequest {
    /// `(handle, contract that owns it)` pairs.
    pub handles: Vec<(Handle, Address)>,
    pub user: Address,
    pub grant: DecryptionGrant,
    /// Wallet verifying key.
    pub signer: [u8; 32],
    pub signature: Vec<u8>,
}

/// Releases clear values to a user holding a valid signed grant.
pub trait DecryptionService {
    fn user_decrypt(
        &self,
        request: &UserDecryptRequest,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<Handle, ClearValue>>;
}

impl DecryptionService for MockCoprocessor {
    fn user_decrypt(
        &self,
        request: &UserDecryptRequest,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<Handle, ClearValue>> {
        request.grant.validate()?;

        let signer =
            request
                .grant
                .verify_signature(self.chain_id(), &request.signer, &request.signature)?;
        if signer != request.user {
            return Err(FheError::SignerMismatch {
                expected: request.user,
                found: signer,
            });
        }

        match request.grant.status_at(now)? {
            GrantStatus::Active => {}
            GrantStatus::NotYetValid => return Err(FheError::GrantNotYetValid),
            GrantStatus::Expired => return Err(FheError::GrantExpired),
        }

        let mut values = BTreeMap::new();
        for (handle, contract) in &request.handles {
            if handle.is_empty() {
                return Err(FheError::EmptyHandle);
            }
            if !request.grant.covers(contract) {
                return Err(FheError::ContractNotAuthorized(*contract));
            }

            let ciphertext = self
                .ciphertext(handle)
                .ok_or(FheError::UnknownHandle(*handle))?;

            for account in [request.user, *contract] {
                if !self.is_allowed(*handle, account) {
                    return Err(FheError::AccessDenied {
                        handle: *handle,
                        account,
                    });
                }
            }

            let value = match ciphertext.fhe_type {
                FheType::Bool => ClearValue::Bool(ciphertext.value != 0),
                FheType::Uint32 => ClearValue::Uint32(ciphertext.value as u32),
            };
            values.insert(*handle, value);
        }

        tracing::debug!(user = %request.user, count = values.len(), "user decryption served");
        Ok(values)
    }
}
