//! Command parsing and dispatch.
//!
//! Every command returns a JSON value that `main` prints on success.

use referral_engine::{Actor, IssuanceService, RedemptionValidator, RuleInput, RuleService};
use referral_shared::context::Context;
use referral_shared::types::{AccountId, Role};
use referral_store::Database;
use serde_json::Value;

use crate::error::CliError;

pub const USAGE: &str = "\
referral rule show
referral rule set <actor-id> <role> <rule-json>
referral rule history <actor-id> <role> [limit] [offset]
referral account add <account-id> <role>
referral code issue <account-id>
referral code validate <code> <account-id> <business-context-id>
referral code redeem <code> <account-id> <business-context-id>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RuleShow,
    RuleSet { actor: Actor, input: RuleInput },
    RuleHistory { actor: Actor, limit: u32, offset: u32 },
    AccountAdd { id: AccountId, role: Role },
    CodeIssue { account: AccountId },
    CodeValidate { code: String, account: AccountId, context_id: String },
    CodeRedeem { code: String, account: AccountId, context_id: String },
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let words: Vec<&str> = args.iter().map(String::as_str).collect();
        match words.as_slice() {
            ["rule", "show"] => Ok(Command::RuleShow),
            ["rule", "set", actor, role, json] => Ok(Command::RuleSet {
                actor: parse_actor(actor, role)?,
                input: serde_json::from_str(json)?,
            }),
            ["rule", "history", actor, role, rest @ ..] if rest.len() <= 2 => {
                Ok(Command::RuleHistory {
                    actor: parse_actor(actor, role)?,
                    limit: parse_number(rest.first().copied(), "limit", 50)?,
                    offset: parse_number(rest.get(1).copied(), "offset", 0)?,
                })
            }
            ["account", "add", id, role] => Ok(Command::AccountAdd {
                id: parse_account(id)?,
                role: parse_role(role)?,
            }),
            ["code", "issue", account] => Ok(Command::CodeIssue {
                account: parse_account(account)?,
            }),
            ["code", "validate", code, account, context_id] => Ok(Command::CodeValidate {
                code: code.to_string(),
                account: parse_account(account)?,
                context_id: context_id.to_string(),
            }),
            ["code", "redeem", code, account, context_id] => Ok(Command::CodeRedeem {
                code: code.to_string(),
                account: parse_account(account)?,
                context_id: context_id.to_string(),
            }),
            _ => Err(CliError::Usage(format!("\n{USAGE}"))),
        }
    }

    pub fn execute(&self, db: &Database, ctx: &Context) -> Result<Value, CliError> {
        let value = match self {
            Command::RuleShow => serde_json::to_value(RuleService::new(db).get_rule(ctx)?)?,
            Command::RuleSet { actor, input } => {
                serde_json::to_value(RuleService::new(db).upsert_rule(ctx, actor, input)?)?
            }
            Command::RuleHistory {
                actor,
                limit,
                offset,
            } => serde_json::to_value(
                RuleService::new(db).list_rule_changes(ctx, actor, *limit, *offset)?,
            )?,
            Command::AccountAdd { id, role } => serde_json::to_value(db.upsert_account(*id, *role)?)?,
            Command::CodeIssue { account } => serde_json::to_value(
                IssuanceService::new(db).get_or_create_basic_code(ctx, *account)?,
            )?,
            Command::CodeValidate {
                code,
                account,
                context_id,
            } => serde_json::to_value(
                RedemptionValidator::new(db).validate(ctx, code, *account, context_id)?,
            )?,
            Command::CodeRedeem {
                code,
                account,
                context_id,
            } => serde_json::to_value(
                RedemptionValidator::new(db).redeem(ctx, code, *account, context_id)?,
            )?,
        };
        Ok(value)
    }
}

fn parse_actor(id: &str, role: &str) -> Result<Actor, CliError> {
    Ok(Actor::new(parse_account(id)?, parse_role(role)?))
}

fn parse_account(s: &str) -> Result<AccountId, CliError> {
    s.parse().map_err(|e| CliError::Usage(format!("{e}")))
}

fn parse_role(s: &str) -> Result<Role, CliError> {
    s.parse().map_err(|e| CliError::Usage(format!("{e}")))
}

fn parse_number(s: Option<&str>, name: &str, default: u32) -> Result<u32, CliError> {
    match s {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| CliError::Usage(format!("{name} must be a non-negative integer"))),
    }
}
