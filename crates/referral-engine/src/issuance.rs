//! Referral code issuance.
//!
//! An account gets at most one basic code.  Creation relies on the store's
//! unique indexes rather than locking: two requests may race to insert, and
//! whichever loses re-reads the account's code and returns the winner's row.
//!
//! Each insert attempt resolves to exactly one [`Attempt`] outcome, and the
//! loop runs at most [`MAX_CODE_ATTEMPTS`] times.

use referral_shared::code::{CodeGenerator, SecureCodeGenerator};
use referral_shared::constants::MAX_CODE_ATTEMPTS;
use referral_shared::context::Context;
use referral_shared::types::{AccountId, CodeType};
use referral_store::{CodeStore, NewReferralCode, ProfileReferralCode, RuleStore, StoreError};
use tracing::{debug, error, info, warn};

use crate::error::{EngineError, Result};
use crate::rules::RuleService;

/// Outcome of one insert attempt.
#[derive(Debug)]
enum Attempt {
    /// The candidate was stored.
    Created(ProfileReferralCode),
    /// A concurrent request created this account's code first.
    LostRace(ProfileReferralCode),
    /// The candidate value is already taken by another code.
    Collision,
}

/// Fetch-or-create service for basic referral codes.
pub struct IssuanceService<'a, S: ?Sized, G = SecureCodeGenerator> {
    store: &'a S,
    rules: RuleService<'a, S>,
    generator: G,
}

impl<'a, S> IssuanceService<'a, S>
where
    S: CodeStore + RuleStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self::with_generator(store, SecureCodeGenerator)
    }
}

impl<'a, S, G> IssuanceService<'a, S, G>
where
    S: CodeStore + RuleStore + ?Sized,
    G: CodeGenerator,
{
    pub fn with_generator(store: &'a S, generator: G) -> Self {
        Self {
            store,
            rules: RuleService::new(store),
            generator,
        }
    }

    /// Return the account's basic code, creating it from the current rule if
    /// the account has none.  Repeated calls return the same code.
    pub fn get_or_create_basic_code(
        &self,
        ctx: &Context,
        account: AccountId,
    ) -> Result<ProfileReferralCode> {
        match self
            .store
            .find_code_by_account_and_type(ctx, account, CodeType::Basic)
        {
            Ok(existing) => {
                debug!(account = %account, code = %existing.code, "referral code already issued");
                return Ok(existing);
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let rule = self.rules.get_rule(ctx)?;
        let template = NewReferralCode {
            profile_id: account,
            code_type: CodeType::Basic,
            is_active: true,
            params: rule.params,
        };

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let candidate = self.generator.generate();
            match self.try_create(ctx, &template, &candidate)? {
                Attempt::Created(code) => {
                    info!(account = %account, code = %code.code, attempt, "referral code issued");
                    return Ok(code);
                }
                Attempt::LostRace(existing) => {
                    warn!(
                        account = %account,
                        code = %existing.code,
                        "concurrent issuance won the race, returning its code"
                    );
                    return Ok(existing);
                }
                Attempt::Collision => {
                    debug!(account = %account, attempt, "referral code collision, retrying");
                }
            }
        }

        error!(
            account = %account,
            attempts = MAX_CODE_ATTEMPTS,
            "exhausted unique referral code generation"
        );
        Err(EngineError::CodeGenerationExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    fn try_create(
        &self,
        ctx: &Context,
        template: &NewReferralCode,
        candidate: &str,
    ) -> Result<Attempt> {
        match self.store.create_code(ctx, template, candidate) {
            Ok(code) => Ok(Attempt::Created(code)),
            Err(StoreError::UniqueViolation(constraint)) => {
                debug!(%constraint, "referral code insert hit a unique constraint");
                match self.store.find_code_by_account_and_type(
                    ctx,
                    template.profile_id,
                    template.code_type,
                ) {
                    Ok(existing) => Ok(Attempt::LostRace(existing)),
                    Err(StoreError::NotFound) => Ok(Attempt::Collision),
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}
