//! In-process coprocessor backing [`FheEnv`].
//!
//! Writes are journaled until [`MockCoprocessor::commit`] so a reverted call
//! or an unpersisted block can be undone in place.

use std::collections::{BTreeMap, BTreeSet};

use fleet_core::{
    Address, CallContext, EncryptedBool, EncryptedU32, EnvError, FheEnv, FheType, Handle,
    InputProof,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::LOCAL_CHAIN_ID;
use crate::input::open_proof;

const COMPUTED_HANDLE_DOMAIN: &[u8] = b"fleet.fhe.computed-handle.v1";

/// A registered ciphertext. The mock keeps the value in the clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub fhe_type: FheType,
    pub value: u64,
}

#[derive(Debug, Clone)]
enum Undo {
    Stored {
        handle: Handle,
        previous: Option<Ciphertext>,
    },
    Allowed {
        handle: Handle,
        account: Address,
    },
    Counter(u64),
}

/// Position in the write journal, see [`MockCoprocessor::journal_mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoprocessorMark(usize);

/// Ciphertext table plus access list, serialized as part of the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockCoprocessor {
    chain_id: u64,
    ciphertexts: BTreeMap<Handle, Ciphertext>,
    acl: BTreeSet<(Handle, Address)>,
    counter: u64,
    #[serde(skip)]
    journal: Vec<Undo>,
}

/// Equality ignores uncommitted journal entries.
impl PartialEq for MockCoprocessor {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id
            && self.ciphertexts == other.ciphertexts
            && self.acl == other.acl
            && self.counter == other.counter
    }
}

impl Eq for MockCoprocessor {}

impl MockCoprocessor {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ciphertexts: BTreeMap::new(),
            acl: BTreeSet::new(),
            counter: 0,
            journal: Vec::new(),
        }
    }

    pub fn journal_mark(&self) -> CoprocessorMark {
        CoprocessorMark(self.journal.len())
    }

    /// Undoes every write recorded after `mark`, newest first.
    pub fn revert_to(&mut self, mark: CoprocessorMark) {
        while self.journal.len() > mark.0 {
            let Some(undo) = self.journal.pop() else {
                break;
            };
            match undo {
                Undo::Stored { handle, previous } => match previous {
                    Some(ciphertext) => {
                        self.ciphertexts.insert(handle, ciphertext);
                    }
                    None => {
                        self.ciphertexts.remove(&handle);
                    }
                },
                Undo::Allowed { handle, account } => {
                    self.acl.remove(&(handle, account));
                }
                Undo::Counter(previous) => self.counter = previous,
            }
        }
    }

    /// Undoes every uncommitted write.
    pub fn rollback(&mut self) {
        self.revert_to(CoprocessorMark(0));
    }

    /// Makes recorded writes permanent.
    pub fn commit(&mut self) {
        self.journal.clear();
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn ciphertext(&self, handle: &Handle) -> Option<Ciphertext> {
        self.ciphertexts.get(handle).copied()
    }

    pub fn len(&self) -> usize {
        self.ciphertexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ciphertexts.is_empty()
    }

    /// Accounts on the access list of `handle`.
    pub fn allowed_accounts(&self, handle: &Handle) -> Vec<Address> {
        self.acl
            .range((*handle, Address::ZERO)..)
            .take_while(|(h, _)| h == handle)
            .map(|(_, account)| *account)
            .collect()
    }

    fn insert(&mut self, handle: Handle, ciphertext: Ciphertext) {
        let previous = self.ciphertexts.insert(handle, ciphertext);
        self.journal.push(Undo::Stored { handle, previous });
    }

    fn store(&mut self, fhe_type: FheType, value: u64) -> Handle {
        self.journal.push(Undo::Counter(self.counter));
        self.counter += 1;

        let mut hasher = Sha256::new();
        hasher.update(COMPUTED_HANDLE_DOMAIN);
        hasher.update(self.chain_id.to_be_bytes());
        hasher.update(self.counter.to_be_bytes());
        hasher.update([fhe_type.tag()]);
        let mut bytes: [u8; 32] = hasher.finalize().into();
        bytes[Handle::TYPE_BYTE] = fhe_type.tag();
        bytes[Handle::VERSION_BYTE] = Handle::VERSION;

        let handle = Handle::from_bytes(bytes);
        self.insert(handle, Ciphertext { fhe_type, value });
        handle
    }

    fn typed(&self, handle: Handle, expected: FheType) -> Result<Ciphertext, EnvError> {
        let ciphertext = self
            .ciphertexts
            .get(&handle)
            .copied()
            .ok_or(EnvError::UnknownHandle(handle))?;
        if ciphertext.fhe_type != expected {
            return Err(EnvError::TypeMismatch {
                handle,
                expected,
                found: ciphertext.fhe_type,
            });
        }
        Ok(ciphertext)
    }
}

impl Default for MockCoprocessor {
    fn default() -> Self {
        Self::new(LOCAL_CHAIN_ID)
    }
}

impl FheEnv for MockCoprocessor {
    fn trivial_encrypt_u32(&mut self, value: u32) -> Result<EncryptedU32, EnvError> {
        Ok(EncryptedU32(self.store(FheType::Uint32, u64::from(value))))
    }

    fn verify_input_u32(
        &mut self,
        input: Handle,
        proof: &InputProof,
        ctx: &CallContext,
    ) -> Result<EncryptedU32, EnvError> {
        let opened = open_proof(proof).map_err(EnvError::InvalidProof)?;

        if opened.body.contract != ctx.contract {
            return Err(EnvError::InvalidProof(format!(
                "proof bound to contract {}, called on {}",
                opened.body.contract, ctx.contract
            )));
        }
        if opened.body.user != ctx.caller {
            return Err(EnvError::InvalidProof(format!(
                "proof bound to user {}, sent by {}",
                opened.body.user, ctx.caller
            )));
        }

        let index = opened
            .handles
            .iter()
            .position(|handle| *handle == input)
            .ok_or_else(|| EnvError::InvalidProof(format!("handle {input} not covered")))?;

        let (fhe_type, value) = opened.body.values[index];
        if fhe_type != FheType::Uint32 {
            return Err(EnvError::TypeMismatch {
                handle: input,
                expected: FheType::Uint32,
                found: fhe_type,
            });
        }

        self.insert(input, Ciphertext { fhe_type, value });
        tracing::trace!(handle = %input, "registered external input");

        Ok(EncryptedU32(input))
    }

    fn le(&mut self, lhs: EncryptedU32, rhs: EncryptedU32) -> Result<EncryptedBool, EnvError> {
        let lhs = self.typed(lhs.handle(), FheType::Uint32)?;
        let rhs = self.typed(rhs.handle(), FheType::Uint32)?;
        let result = lhs.value <= rhs.value;
        Ok(EncryptedBool(self.store(FheType::Bool, u64::from(result))))
    }

    fn allow(&mut self, handle: Handle, account: Address) -> Result<(), EnvError> {
        if !self.ciphertexts.contains_key(&handle) {
            return Err(EnvError::UnknownHandle(handle));
        }
        if self.acl.insert((handle, account)) {
            self.journal.push(Undo::Allowed { handle, account });
        }
        Ok(())
    }

    fn is_allowed(&self, handle: Handle, account: Address) -> bool {
        self.acl.contains(&(handle, account))
    }
}
