//! HTLC Parameter Generator Module
//!
//! This module owns the cryptographic commitments of a swap: preimage
//! generation, hashlock derivation, and the deterministic contract id
//! joining the two chain-side HTLC instances. It also enforces the
//! configured timelock window.
//!
//! ## Invariants
//!
//! - `hashlock = SHA-256(preimage)` over the raw 32 preimage bytes.
//! - The contract id is a pure function of
//!   `(initiator, participant, amount, hashlock, timelock)`; recomputing
//!   it from the same inputs always yields the same 32 bytes.
//! - Preimages come from the OS CSPRNG, never from predictable input.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::SwapError;

/// Width in bytes of preimages, hashlocks, and contract ids.
pub const COMMITMENT_LEN: usize = 32;

/// Domain-separation tag mixed into contract-id derivation.
const CONTRACT_ID_TAG: &[u8] = b"htlc-contract-v1";

// ============================================================================
// FIXED-WIDTH BYTE TYPES
// ============================================================================

/// Secret preimage whose hash equals the hashlock. Revealing it claims
/// the locked funds, so it must never be logged or transmitted before
/// the reveal phase.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Preimage(pub [u8; COMMITMENT_LEN]);

/// Public hash commitment of a secret preimage.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hashlock(pub [u8; COMMITMENT_LEN]);

/// Deterministic identifier joining the two chain-side HTLC instances of
/// one logical swap.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractId(pub [u8; COMMITMENT_LEN]);

/// Parses a `0x`-prefixed (or bare) hex string into 32 bytes.
fn parse_hex32(value: &str) -> Result<[u8; COMMITMENT_LEN], String> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(stripped).map_err(|e| format!("invalid hex: {}", e))?;
    if bytes.len() != COMMITMENT_LEN {
        return Err(format!(
            "expected {} bytes, got {}",
            COMMITMENT_LEN,
            bytes.len()
        ));
    }
    let mut out = [0u8; COMMITMENT_LEN];
    out.copy_from_slice(&bytes);
    Ok(out)
}

fn to_hex32(bytes: &[u8; COMMITMENT_LEN]) -> String {
    format!("0x{}", hex::encode(bytes))
}

macro_rules! bytes32_impls {
    ($name:ident) => {
        impl $name {
            /// Parses from a `0x`-prefixed hex string (32 bytes).
            pub fn from_hex(value: &str) -> Result<Self, String> {
                parse_hex32(value).map(Self)
            }

            /// Returns the `0x`-prefixed lowercase hex encoding.
            pub fn to_hex(&self) -> String {
                to_hex32(&self.0)
            }

            /// Raw byte view.
            pub fn as_bytes(&self) -> &[u8; COMMITMENT_LEN] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(D::Error::custom)
            }
        }
    };
}

bytes32_impls!(Hashlock);
bytes32_impls!(ContractId);

// Preimage deliberately gets no Serialize impl: it must never leave the
// process through a serialized payload. Debug output is redacted.
impl Preimage {
    /// Parses from a `0x`-prefixed hex string (32 bytes). Used when a
    /// preimage is recovered from on-chain withdrawal data.
    pub fn from_hex(value: &str) -> Result<Self, String> {
        parse_hex32(value).map(Self)
    }

    /// Returns the `0x`-prefixed hex encoding for ledger submission.
    pub fn to_hex(&self) -> String {
        to_hex32(&self.0)
    }

    /// Raw byte view.
    pub fn as_bytes(&self) -> &[u8; COMMITMENT_LEN] {
        &self.0
    }

    /// Generates a fresh preimage from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; COMMITMENT_LEN];
        OsRng.fill_bytes(&mut bytes);
        Preimage(bytes)
    }
}

impl PartialEq<Preimage> for Hashlock {
    /// A hashlock "equals" a preimage when the preimage hashes to it.
    fn eq(&self, preimage: &Preimage) -> bool {
        compute_hashlock(preimage) == *self
    }
}

impl fmt::Debug for Preimage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Preimage(<redacted>)")
    }
}

// ============================================================================
// DERIVATIONS
// ============================================================================

/// Computes the hashlock for a preimage: a single SHA-256 over the raw
/// 32 preimage bytes, matching the on-chain contract's hash check.
pub fn compute_hashlock(preimage: &Preimage) -> Hashlock {
    let digest = Sha256::digest(preimage.as_bytes());
    let mut out = [0u8; COMMITMENT_LEN];
    out.copy_from_slice(&digest);
    Hashlock(out)
}

/// Derives the deterministic contract id for a swap.
///
/// The id is SHA-256 over a canonical, length-prefixed encoding of the
/// participants, the amount (as its normalized decimal string), the
/// hashlock, and the source timelock, under a fixed domain tag. Both
/// chain-side HTLC instances are created under this id, so it must be
/// recomputable from the same inputs in any process.
pub fn generate_contract_id(
    initiator: &str,
    participant: &str,
    amount: &Decimal,
    hashlock: &Hashlock,
    timelock: u64,
) -> ContractId {
    let mut hasher = Sha256::new();
    hasher.update(CONTRACT_ID_TAG);
    for field in [initiator.as_bytes(), participant.as_bytes()] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field);
    }
    let amount_str = amount.normalize().to_string();
    hasher.update((amount_str.len() as u64).to_be_bytes());
    hasher.update(amount_str.as_bytes());
    hasher.update(hashlock.as_bytes());
    hasher.update(timelock.to_be_bytes());

    let digest = hasher.finalize();
    let mut out = [0u8; COMMITMENT_LEN];
    out.copy_from_slice(&digest);
    ContractId(out)
}

// ============================================================================
// TIMELOCK VALIDATION
// ============================================================================

/// Validates an absolute timelock expiry against the configured window.
///
/// The expiry must fall within `[now + min_secs, now + max_secs]` so
/// funds are neither refundable before confirmation is possible nor
/// locked indefinitely.
///
/// # Arguments
///
/// * `candidate` - Proposed absolute expiry (epoch seconds)
/// * `min_secs` - Minimum lock duration (e.g. 1 hour)
/// * `max_secs` - Maximum lock duration (e.g. 48 hours)
/// * `now` - Current time (epoch seconds)
pub fn validate_timelock(
    candidate: u64,
    min_secs: u64,
    max_secs: u64,
    now: u64,
) -> Result<(), SwapError> {
    if candidate < now + min_secs || candidate > now + max_secs {
        return Err(SwapError::TimelockOutOfBounds {
            candidate,
            min: min_secs,
            max: max_secs,
        });
    }
    Ok(())
}

/// Derives the destination-side timelock from the source-side one.
///
/// The destination lock expires at half the remaining source window, so
/// the initiator can safely reveal the preimage on the destination side
/// well before the source timelock that funds their own refund expires.
/// Always strictly less than `source_timelock` for any non-empty window.
pub fn derive_dest_timelock(source_timelock: u64, now: u64) -> u64 {
    let window = source_timelock.saturating_sub(now);
    now + window / 2
}
