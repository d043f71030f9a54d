//! Singleton referral rule lifecycle.
//!
//! [`RuleService`] reads the rule (creating it with defaults on first use),
//! applies validated admin mutations, and suppresses writes that would not
//! change anything so the audit log only records real changes.

pub mod diff;
pub mod input;

use referral_shared::context::Context;
use referral_shared::types::RuleParams;
use referral_store::{AccountDirectory, ReferralRule, ReferralRuleChange, RuleStore, StoreError};
use tracing::{debug, info, warn};

use crate::actor::Actor;
use crate::error::{EngineError, Result};

pub use diff::changed_fields;
pub use input::RuleInput;

/// Service owning the rule singleton.
pub struct RuleService<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: ?Sized> Clone for RuleService<'a, S> {
    fn clone(&self) -> Self {
        Self { store: self.store }
    }
}

impl<'a, S> RuleService<'a, S>
where
    S: RuleStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Current rule, created with the default parameters if absent.
    pub fn get_rule(&self, ctx: &Context) -> Result<ReferralRule> {
        match self.store.read_rule(ctx) {
            Ok(rule) => Ok(rule),
            Err(StoreError::NotFound) => {
                debug!("no referral rule yet, initializing defaults");
                Ok(self.store.init_rule(ctx, &RuleParams::default())?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<'a, S> RuleService<'a, S>
where
    S: RuleStore + AccountDirectory + ?Sized,
{
    /// Apply an admin's rule change.
    ///
    /// Returns the rule as persisted.  Submitting the current values again is
    /// a no-op: nothing is written and no audit row is added.
    pub fn upsert_rule(
        &self,
        ctx: &Context,
        actor: &Actor,
        input: &RuleInput,
    ) -> Result<ReferralRule> {
        self.authorize(ctx, actor)?;

        let params = input.validate()?;
        let current = self.get_rule(ctx)?;

        let changed = changed_fields(&current.params, &params);
        if changed.is_empty() {
            debug!(actor = %actor.id, "referral rule unchanged, skipping write");
            return Ok(current);
        }

        let Some((rule, change)) = self.store.upsert_rule_audited(ctx, actor.id, &params)? else {
            // A concurrent request applied the same values first.
            debug!(actor = %actor.id, "referral rule already updated, skipping write");
            return Ok(self.store.read_rule(ctx)?);
        };
        info!(
            actor = %actor.id,
            change_id = %change.id,
            changed = ?changed,
            "referral rule updated"
        );
        Ok(rule)
    }

    /// Audit log of rule changes, newest first.  Admin only.
    pub fn list_rule_changes(
        &self,
        ctx: &Context,
        actor: &Actor,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ReferralRuleChange>> {
        self.authorize(ctx, actor)?;
        Ok(self.store.list_rule_changes(ctx, limit, offset)?)
    }

    fn authorize(&self, ctx: &Context, actor: &Actor) -> Result<()> {
        if !actor.role.is_admin() {
            warn!(actor = %actor.id, role = %actor.role, "non-admin attempted rule access");
            return Err(EngineError::Forbidden(
                "admin role required to manage referral rules".to_string(),
            ));
        }

        let account = match self.store.get_account(ctx, actor.id) {
            Ok(account) => account,
            Err(StoreError::NotFound) => {
                return Err(EngineError::NotFound(format!("Account {}", actor.id)))
            }
            Err(e) => return Err(e.into()),
        };

        if !account.role.is_admin() {
            warn!(actor = %actor.id, "session role disagrees with stored role");
            return Err(EngineError::Forbidden(
                "admin role required to manage referral rules".to_string(),
            ));
        }
        Ok(())
    }
}
