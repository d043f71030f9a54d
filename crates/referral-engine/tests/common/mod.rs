#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use referral_shared::code::{CodeGenerator, SecureCodeGenerator};
use referral_shared::types::{AccountId, Role};
use referral_store::database::DEFAULT_BUSY_TIMEOUT;
use referral_store::Database;

pub fn open(path: &Path) -> Database {
    Database::open_at(path, DEFAULT_BUSY_TIMEOUT).expect("open database")
}

pub fn open_temp() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir.path().join("referrals.db"));
    (dir, db)
}

pub fn account(db: &Database, role: Role) -> AccountId {
    let id = AccountId::new();
    db.upsert_account(id, role).unwrap();
    id
}

/// Hands out scripted codes first, then falls back to random ones.
/// Counts every call.
pub struct ScriptedGenerator {
    queue: Mutex<VecDeque<String>>,
    pub calls: AtomicU32,
}

impl ScriptedGenerator {
    pub fn new<I: IntoIterator<Item = &'static str>>(codes: I) -> Self {
        Self {
            queue: Mutex::new(codes.into_iter().map(String::from).collect()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CodeGenerator for &ScriptedGenerator {
    fn generate(&self) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| SecureCodeGenerator.generate())
    }
}
