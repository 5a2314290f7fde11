//! Mint authority lifecycle
//!
//! Present -> Transferred -> Revoked. Revocation is final on-chain, so once
//! a mint reaches `Revoked` every further handoff is refused here rather
//! than sent to the ledger to fail.

use solana_sdk::pubkey::Pubkey;

use crate::error::{FeeTokenError, FeeTokenResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MintAuthority {
    /// Held by the key that initialized the mint
    Present(Pubkey),
    /// Handed to another key
    Transferred(Pubkey),
    /// Set to none; supply is fixed
    Revoked,
}

/// Requested change to the mint authority
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handoff {
    TransferTo(Pubkey),
    Revoke,
}

impl MintAuthority {
    /// Current signing key, if any
    pub fn holder(&self) -> Option<Pubkey> {
        match self {
            MintAuthority::Present(key) | MintAuthority::Transferred(key) => Some(*key),
            MintAuthority::Revoked => None,
        }
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self, MintAuthority::Revoked)
    }

    /// State after `handoff`
    pub fn apply(&self, handoff: Handoff) -> FeeTokenResult<MintAuthority> {
        if self.is_revoked() {
            return Err(FeeTokenError::AuthorityRevoked);
        }
        Ok(match handoff {
            Handoff::TransferTo(key) => MintAuthority::Transferred(key),
            Handoff::Revoke => MintAuthority::Revoked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_progression() {
        let original = Pubkey::new_unique();
        let next = Pubkey::new_unique();

        let state = MintAuthority::Present(original);
        assert_eq!(state.holder(), Some(original));

        let state = state.apply(Handoff::TransferTo(next)).unwrap();
        assert_eq!(state, MintAuthority::Transferred(next));
        assert_eq!(state.holder(), Some(next));

        let state = state.apply(Handoff::Revoke).unwrap();
        assert!(state.is_revoked());
        assert_eq!(state.holder(), None);
    }

    #[test]
    fn test_revoked_is_final() {
        let state = MintAuthority::Revoked;
        assert!(matches!(
            state.apply(Handoff::TransferTo(Pubkey::new_unique())),
            Err(FeeTokenError::AuthorityRevoked)
        ));
        assert!(matches!(
            state.apply(Handoff::Revoke),
            Err(FeeTokenError::AuthorityRevoked)
        ));
    }
}
