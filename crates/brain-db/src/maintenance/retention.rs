//! Retention policy and the sweep batch it parameterizes

use crate::statement::Statement;

/// Grace windows for the retention sweep
///
/// Timestamps in the account table are UTC `YYYY-MM-DD HH:MM:SS` strings,
/// the format SQLite's `datetime('now')` produces.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Days past `verification_expiration` before an unverified account is
    /// deleted
    pub verification_grace_days: u32,
    /// Days past `reset_expiration` before a pending password reset is
    /// marked expired
    pub reset_grace_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            verification_grace_days: 7,
            reset_grace_days: 1,
        }
    }
}

impl RetentionPolicy {
    /// The fixed sweep batch, in application order:
    ///
    /// 1. Delete accounts that never verified and whose verification window
    ///    lapsed more than the grace period ago.
    /// 2. Clear leftover verification artifacts on accounts that did verify.
    /// 3. Expire pending password-reset requests whose window lapsed more
    ///    than the grace period ago, clearing their tokens.
    pub fn sweep_statements(&self) -> Vec<Statement> {
        vec![
            Statement::new(
                "DELETE FROM chat_users \
                 WHERE is_verified = 0 \
                 AND verification_expiration < datetime('now', ?1)",
            )
            .bind(format!("-{} days", self.verification_grace_days)),
            Statement::new(
                "UPDATE chat_users \
                 SET verification_token = NULL, verification_expiration = NULL \
                 WHERE is_verified = 1 \
                 AND (verification_expiration < datetime('now') OR verification_token IS NOT NULL)",
            ),
            Statement::new(
                "UPDATE chat_users \
                 SET reset_token = NULL, reset_expiration = NULL, reset_status = 'EXPIRED' \
                 WHERE reset_status = 'PENDING' \
                 AND reset_expiration < datetime('now', ?1)",
            )
            .bind(format!("-{} days", self.reset_grace_days)),
        ]
    }
}
