//! Merkle whitelist gate.
//!
//! A gated offer stores a 32-byte commitment to the set of accounts allowed
//! to accept it. Verification recomputes the root from the candidate's leaf
//! hash and the supplied sibling path. Sibling pairs are ordered bytewise
//! before combining, so a proof carries no position bits and verification
//! is independent of where the leaf sat in the tree.
//!
//! These are pure free functions, unit-testable without any offer or loan
//! state. Verification is constant-path: every proof node is folded in and
//! a single comparison happens at the end, so a probing caller learns
//! nothing about which node diverged.

use openlend_types::{AccountId, Gate, OpenlendError, Result, WhitelistRoot};
use sha2::{Digest, Sha256};

/// A single sibling hash in a membership proof.
pub type ProofNode = [u8; 32];

const LEAF_DOMAIN: &[u8] = b"openlend:whitelist:leaf:";
const NODE_DOMAIN: &[u8] = b"openlend:whitelist:node:";

/// Hash an account into its leaf position.
#[must_use]
pub fn leaf_hash(member: &AccountId) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(LEAF_DOMAIN);
    hasher.update(member.as_bytes());
    hasher.finalize().into()
}

/// Combine two child hashes into their parent, ordering the pair bytewise
/// first so the result is position-independent.
#[must_use]
pub fn combine(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(NODE_DOMAIN);
    hasher.update(lo);
    hasher.update(hi);
    hasher.finalize().into()
}

/// Verify that `member` is committed to by `root` via `proof`.
///
/// A well-formed but non-matching proof returns `false`; it is never an
/// error. The empty proof is valid exactly for a single-member tree.
#[must_use]
pub fn verify_membership(root: WhitelistRoot, member: &AccountId, proof: &[ProofNode]) -> bool {
    let computed = proof
        .iter()
        .fold(leaf_hash(member), |acc, node| combine(&acc, node));
    computed == root.0
}

/// Gate check: an OPEN gate admits unconditionally.
#[must_use]
pub fn admits(gate: &Gate, member: &AccountId, proof: &[ProofNode]) -> bool {
    match gate {
        Gate::Open => true,
        Gate::Gated(root) => verify_membership(*root, member, proof),
    }
}

/// Parse hex-encoded proof nodes (with or without `0x` prefixes).
///
/// This is the boundary where malformed input — bad hex, wrong-length
/// nodes — becomes a hard [`OpenlendError::MalformedProof`] error, as
/// opposed to a legitimately-shaped proof that merely fails to verify.
pub fn parse_proof(nodes: &[impl AsRef<str>]) -> Result<Vec<ProofNode>> {
    nodes
        .iter()
        .map(|node| {
            let s = node.as_ref();
            let s = s.strip_prefix("0x").unwrap_or(s);
            let bytes = hex::decode(s).map_err(|e| OpenlendError::MalformedProof {
                reason: format!("proof node is not valid hex: {e}"),
            })?;
            bytes
                .try_into()
                .map_err(|v: Vec<u8>| OpenlendError::MalformedProof {
                    reason: format!("proof node must be 32 bytes, got {}", v.len()),
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tree construction (offer tooling and tests)
// ---------------------------------------------------------------------------

/// Compute the root committing to `members`.
///
/// Levels are built bottom-up; an odd trailing node is promoted unchanged.
/// Returns `None` for an empty member set (an empty whitelist cannot admit
/// anyone; use [`Gate::Open`] for unrestricted offers).
#[must_use]
pub fn whitelist_root(members: &[AccountId]) -> Option<WhitelistRoot> {
    if members.is_empty() {
        return None;
    }
    let mut level: Vec<[u8; 32]> = members.iter().map(leaf_hash).collect();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => combine(a, b),
                [a] => *a,
                _ => unreachable!("chunks(2) yields 1 or 2 elements"),
            })
            .collect();
    }
    Some(WhitelistRoot(level[0]))
}

/// Build the membership proof for `member`, or `None` if it is not in the
/// set.
#[must_use]
pub fn proof_for(members: &[AccountId], member: &AccountId) -> Option<Vec<ProofNode>> {
    let mut index = members.iter().position(|m| m == member)?;
    let mut level: Vec<[u8; 32]> = members.iter().map(leaf_hash).collect();
    let mut proof = Vec::new();

    while level.len() > 1 {
        let sibling = if index % 2 == 0 { index + 1 } else { index - 1 };
        if sibling < level.len() {
            proof.push(level[sibling]);
        }
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => combine(a, b),
                [a] => *a,
                _ => unreachable!("chunks(2) yields 1 or 2 elements"),
            })
            .collect();
        index /= 2;
    }
    Some(proof)
}
