//! Document storage for asteroids and impact scenarios
//!
//! Redis data model:
//! - asteroid:{neo_reference_id} → JSON document
//! - asteroids:all → Set of all neo_reference_ids
//! - asteroids:tier:{tier} → Set of ids currently in that tier
//! - asteroids:hazardous → Set of ids flagged potentially hazardous
//! - scenario:{uuid} → JSON document
//! - scenarios:all → Sorted set (score=created_at millis, member=uuid)

use anyhow::{Context, Result};
use async_trait::async_trait;
use asteroid_common::{ImpactScenario, NearEarthObject, RiskTier};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

const ASTEROIDS_ALL: &str = "asteroids:all";
const ASTEROIDS_HAZARDOUS: &str = "asteroids:hazardous";
const SCENARIOS_ALL: &str = "scenarios:all";

fn asteroid_key(neo_reference_id: &str) -> String {
    format!("asteroid:{}", neo_reference_id)
}

fn tier_key(tier: RiskTier) -> String {
    format!("asteroids:tier:{}", tier)
}

fn scenario_key(id: &str) -> String {
    format!("scenario:{}", id)
}

/// Inclusive ZRANGE stop index for the first `limit` members (`limit > 0`).
/// Limits past `isize::MAX` map to -1, the last member.
fn zrange_stop(limit: usize) -> isize {
    isize::try_from(limit - 1).unwrap_or(-1)
}

/// Aggregate counts for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_asteroids: usize,
    pub hazardous_asteroids: usize,
    pub critical_risk_count: usize,
    pub high_risk_count: usize,
    pub moderate_risk_count: usize,
    pub low_risk_count: usize,
    pub total_scenarios: usize,
}

impl DashboardStats {
    fn set_tier_count(&mut self, tier: RiskTier, count: usize) {
        match tier {
            RiskTier::Critical => self.critical_risk_count = count,
            RiskTier::High => self.high_risk_count = count,
            RiskTier::Moderate => self.moderate_risk_count = count,
            RiskTier::Low => self.low_risk_count = count,
        }
    }
}

/// Persistence for ingested asteroids and created scenarios.
///
/// Asteroids are listed in `neo_reference_id` order, scenarios in creation order.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn health_check(&self) -> Result<()>;

    async fn get_asteroid(&self, neo_reference_id: &str) -> Result<Option<NearEarthObject>>;

    /// Insert or replace by `neo_reference_id`.
    /// Returns Ok(true) if the asteroid was new.
    async fn put_asteroid(&self, neo: &NearEarthObject) -> Result<bool>;

    async fn list_asteroids(
        &self,
        tier: Option<RiskTier>,
        limit: usize,
    ) -> Result<Vec<NearEarthObject>>;

    async fn put_scenario(&self, scenario: &ImpactScenario) -> Result<()>;

    async fn list_scenarios(&self, limit: usize) -> Result<Vec<ImpactScenario>>;

    async fn stats(&self) -> Result<DashboardStats>;
}

/// Redis-backed storage
pub struct RedisStorage {
    conn: ConnectionManager,
}

impl RedisStorage {
    /// Create a new storage instance
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        info!("Connected to Redis at {}", redis_url);

        Ok(Self { conn })
    }

    async fn load_documents<T>(&self, keys: Vec<String>, kind: &str) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let docs: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        docs.into_iter()
            .flatten()
            .map(|json| {
                serde_json::from_str(&json)
                    .with_context(|| format!("Failed to deserialize {}", kind))
            })
            .collect()
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn get_asteroid(&self, neo_reference_id: &str) -> Result<Option<NearEarthObject>> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.get(asteroid_key(neo_reference_id)).await?;

        match json {
            Some(data) => {
                let neo = serde_json::from_str(&data).context("Failed to deserialize asteroid")?;
                Ok(Some(neo))
            }
            None => Ok(None),
        }
    }

    async fn put_asteroid(&self, neo: &NearEarthObject) -> Result<bool> {
        let mut conn = self.conn.clone();
        let key = asteroid_key(&neo.neo_reference_id);
        let id = neo.neo_reference_id.as_str();

        let json = serde_json::to_string(neo).context("Failed to serialize asteroid")?;

        // Document and every index move together so the tier sets never
        // disagree with the stored risk_level. The SADD reply on
        // asteroids:all tells whether the id was new.
        let mut pipe = redis::pipe();
        pipe.atomic()
            .sadd(ASTEROIDS_ALL, id)
            .set(&key, json)
            .ignore();
        for tier in RiskTier::ALL {
            if tier == neo.risk_level {
                pipe.sadd(tier_key(tier), id).ignore();
            } else {
                pipe.srem(tier_key(tier), id).ignore();
            }
        }
        if neo.is_potentially_hazardous_asteroid {
            pipe.sadd(ASTEROIDS_HAZARDOUS, id).ignore();
        } else {
            pipe.srem(ASTEROIDS_HAZARDOUS, id).ignore();
        }
        let (added,): (usize,) = pipe.query_async(&mut conn).await?;
        let is_new = added == 1;

        debug!(
            "Stored asteroid {} ({}, {})",
            id,
            neo.risk_level,
            if is_new { "new" } else { "replaced" }
        );
        Ok(is_new)
    }

    async fn list_asteroids(
        &self,
        tier: Option<RiskTier>,
        limit: usize,
    ) -> Result<Vec<NearEarthObject>> {
        let mut conn = self.conn.clone();
        let index = match tier {
            Some(t) => tier_key(t),
            None => ASTEROIDS_ALL.to_string(),
        };

        let mut ids: Vec<String> = conn.smembers(&index).await?;
        ids.sort();
        ids.truncate(limit);

        let keys = ids.iter().map(|id| asteroid_key(id)).collect();
        self.load_documents(keys, "asteroid").await
    }

    async fn put_scenario(&self, scenario: &ImpactScenario) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(scenario).context("Failed to serialize scenario")?;

        let _: () = redis::pipe()
            .atomic()
            .set(scenario_key(&scenario.id), json)
            .ignore()
            .zadd(
                SCENARIOS_ALL,
                &scenario.id,
                scenario.created_at.timestamp_millis(),
            )
            .ignore()
            .query_async(&mut conn)
            .await?;

        info!(
            "Stored impact scenario {} for asteroid {}",
            scenario.id, scenario.asteroid_id
        );
        Ok(())
    }

    async fn list_scenarios(&self, limit: usize) -> Result<Vec<ImpactScenario>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.zrange(SCENARIOS_ALL, 0, zrange_stop(limit)).await?;

        let keys = ids.iter().map(|id| scenario_key(id)).collect();
        self.load_documents(keys, "scenario").await
    }

    async fn stats(&self) -> Result<DashboardStats> {
        let mut conn = self.conn.clone();
        let mut stats = DashboardStats {
            total_asteroids: conn.scard(ASTEROIDS_ALL).await?,
            hazardous_asteroids: conn.scard(ASTEROIDS_HAZARDOUS).await?,
            total_scenarios: conn.zcard(SCENARIOS_ALL).await?,
            ..Default::default()
        };
        for tier in RiskTier::ALL {
            let count: usize = conn.scard(tier_key(tier)).await?;
            stats.set_tier_count(tier, count);
        }
        Ok(stats)
    }
}

#[derive(Default)]
struct MemoryInner {
    asteroids: BTreeMap<String, NearEarthObject>,
    scenarios: Vec<ImpactScenario>,
}

/// In-process storage for development and tests
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<MemoryInner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn get_asteroid(&self, neo_reference_id: &str) -> Result<Option<NearEarthObject>> {
        let inner = self.inner.read().await;
        Ok(inner.asteroids.get(neo_reference_id).cloned())
    }

    async fn put_asteroid(&self, neo: &NearEarthObject) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let previous = inner
            .asteroids
            .insert(neo.neo_reference_id.clone(), neo.clone());
        Ok(previous.is_none())
    }

    async fn list_asteroids(
        &self,
        tier: Option<RiskTier>,
        limit: usize,
    ) -> Result<Vec<NearEarthObject>> {
        let inner = self.inner.read().await;
        Ok(inner
            .asteroids
            .values()
            .filter(|neo| tier.map_or(true, |t| neo.risk_level == t))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn put_scenario(&self, scenario: &ImpactScenario) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.scenarios.push(scenario.clone());
        Ok(())
    }

    async fn list_scenarios(&self, limit: usize) -> Result<Vec<ImpactScenario>> {
        let inner = self.inner.read().await;
        Ok(inner.scenarios.iter().take(limit).cloned().collect())
    }

    async fn stats(&self) -> Result<DashboardStats> {
        let inner = self.inner.read().await;
        let mut stats = DashboardStats {
            total_asteroids: inner.asteroids.len(),
            hazardous_asteroids: inner
                .asteroids
                .values()
                .filter(|neo| neo.is_potentially_hazardous_asteroid)
                .count(),
            total_scenarios: inner.scenarios.len(),
            ..Default::default()
        };
        for tier in RiskTier::ALL {
            let count = inner
                .asteroids
                .values()
                .filter(|neo| neo.risk_level == tier)
                .count();
            stats.set_tier_count(tier, count);
        }
        Ok(stats)
    }
}
