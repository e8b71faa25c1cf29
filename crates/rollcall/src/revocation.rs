//! Privileged reversal of a redemption.
//!
//! A revert never touches the original record. It appends a [`Revocation`]
//! and releases the (participant, action) claim, so the pair can be redeemed
//! again while history keeps both records.

use rollcall_core::{ErrorKind, RedemptionId, Revocation, RevocationId, UserId};
use rollcall_store::{RevokeResult, StoreError};

use crate::engine::VerificationEngine;
use crate::error::{Result, VerificationError};

impl VerificationEngine {
    /// Revoke a redemption. Only admins may do this.
    ///
    /// Reverting an already-revoked redemption returns the revocation on record.
    pub async fn revert(
        &self,
        redemption_id: &RedemptionId,
        admin_id: &UserId,
        reason: Option<&str>,
    ) -> Result<Revocation> {
        let admin = self.load_verifier(admin_id).await?;
        if !admin.is_admin() {
            return Err(VerificationError::new(
                ErrorKind::PermissionDenied,
                "only admins can revert verifications",
            ));
        }

        let revocation = Revocation {
            id: RevocationId::new_v4(),
            redemption_id: *redemption_id,
            revoked_by: admin.id,
            revoked_at: self.now(),
            reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        };

        match self.stores.logs.insert_revocation(&revocation).await {
            Ok(RevokeResult::Revoked) => {
                tracing::info!(
                    redemption_id = %redemption_id,
                    revocation_id = %revocation.id,
                    admin_id = %admin.id,
                    "redemption revoked"
                );
                Ok(revocation)
            }
            Ok(RevokeResult::AlreadyRevoked { existing }) => {
                tracing::debug!(
                    redemption_id = %redemption_id,
                    revocation_id = %existing.id,
                    "redemption already revoked"
                );
                Ok(existing)
            }
            Err(StoreError::NotFound { .. }) => Err(VerificationError::new(
                ErrorKind::RedemptionNotFound,
                format!("verification not found: {}", redemption_id),
            )),
            Err(err) => Err(err.into()),
        }
    }
}
