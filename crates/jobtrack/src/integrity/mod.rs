//! Referential integrity guard for shared lookup entities.
//!
//! Deleting a lookup row that other records still point at would strand
//! those records, so every delete handler checks the entity's fixed
//! dependent specs first and refuses while any reference remains.
//!
//! This is a check-then-act protocol, not a transaction: a dependent
//! record inserted between the check and the delete slips through. A
//! hardened build would close the gap with a conditional delete inside
//! a store transaction.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{debug, instrument};

/// Key of the reference entity under deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKey {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKey::Int(v) => write!(f, "{v}"),
            EntityKey::Text(v) => write!(f, "{v}"),
        }
    }
}

/// How a dependent collection stores the reference.
#[derive(Debug, Clone, Copy)]
pub enum MatchRule {
    /// Scalar foreign key column compared by equality.
    Equals(&'static str),
    /// JSON-array column searched by membership.
    Contains(&'static str),
}

/// One collection that may hold references to the entity.
#[derive(Debug, Clone, Copy)]
pub struct DependentSpec {
    pub collection: &'static str,
    pub rule: MatchRule,
}

impl DependentSpec {
    pub const fn equals(collection: &'static str, field: &'static str) -> Self {
        Self {
            collection,
            rule: MatchRule::Equals(field),
        }
    }

    pub const fn contains(collection: &'static str, field: &'static str) -> Self {
        Self {
            collection,
            rule: MatchRule::Contains(field),
        }
    }
}

/// Outcome of a deletability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletability {
    Deletable,
    /// Total number of records still referencing the key.
    InUse(i64),
}

/// Checks whether a reference entity can be deleted safely.
///
/// The pool is injected explicitly so tests can substitute an
/// in-memory store; the guard never reaches for ambient globals.
#[derive(Debug, Clone)]
pub struct ReferentialIntegrityGuard {
    pool: SqlitePool,
}

impl ReferentialIntegrityGuard {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Count live references to `key` across the fixed dependent specs.
    ///
    /// One lookup per spec, sequential. Read-only: repeated calls with
    /// no intervening mutation return identical results.
    #[instrument(skip(self, specs))]
    pub async fn check_deletable(
        &self,
        key: &EntityKey,
        specs: &[DependentSpec],
    ) -> Result<Deletability> {
        let mut total = 0i64;

        for spec in specs {
            // Collection and field names come from compile-time specs,
            // never from request input.
            let sql = match spec.rule {
                MatchRule::Equals(field) => format!(
                    "SELECT COUNT(*) FROM {} WHERE {} = ?",
                    spec.collection, field
                ),
                MatchRule::Contains(field) => format!(
                    "SELECT COUNT(*) FROM {c}, json_each({c}.{f}) WHERE json_each.value = ?",
                    c = spec.collection,
                    f = field
                ),
            };

            let query = sqlx::query_as::<_, (i64,)>(&sql);
            let query = match key {
                EntityKey::Int(v) => query.bind(*v),
                EntityKey::Text(v) => query.bind(v),
            };

            let (count,) = query
                .fetch_one(&self.pool)
                .await
                .with_context(|| format!("counting references in {}", spec.collection))?;

            if count > 0 {
                debug!(
                    collection = spec.collection,
                    count, "entity still referenced"
                );
            }
            total += count;
        }

        if total == 0 {
            Ok(Deletability::Deletable)
        } else {
            Ok(Deletability::InUse(total))
        }
    }
}
