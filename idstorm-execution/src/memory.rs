//! In-memory simulated target
//!
//! Behaves like a strict provisioning endpoint: duplicate creates conflict,
//! updates and deletes of missing records report not-found. An optional
//! failure rate turns calls into transport errors before they touch the
//! store.

use async_trait::async_trait;
use idstorm_config::MemoryTargetConfig;
use idstorm_core::{
    IdentityRecord, RecordId, RecordTemplate, Status, TargetOperations, TargetResponse,
    TransportError,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub struct InMemoryTarget {
    records: Mutex<HashMap<String, IdentityRecord>>,
    failure_rate: f64,
    rng: Mutex<StdRng>,
    latency: Duration,
    calls: AtomicU64,
}

impl InMemoryTarget {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            failure_rate: 0.0,
            rng: Mutex::new(StdRng::from_entropy()),
            latency: Duration::ZERO,
            calls: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &MemoryTargetConfig) -> Self {
        let target = Self::new()
            .with_failure_rate(config.failure_rate)
            .with_latency(Duration::from_millis(config.latency_ms));
        match config.seed {
            Some(seed) => target.with_seed(seed),
            None => target,
        }
    }

    /// Fraction of calls, in `[0, 1)`, that fail with a transport error
    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Insert every record of `[1, total]` as a create would
    pub fn preload(&self, template: &RecordTemplate, total: u64) {
        let mut records = self.records.lock();
        for id in RecordId::universe(total) {
            let record = template.render(id, idstorm_core::OperationKind::Create);
            records.insert(record.uid.clone(), record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn get(&self, uid: &str) -> Option<IdentityRecord> {
        self.records.lock().get(uid).cloned()
    }

    /// Number of calls received, failed ones included
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn simulate_link(&self) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failure_rate > 0.0 && self.rng.lock().gen::<f64>() < self.failure_rate {
            return Err(TransportError::Io("simulated packet loss".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryTarget {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetOperations for InMemoryTarget {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, record: &IdentityRecord) -> TargetResponse {
        self.simulate_link().await?;
        let mut records = self.records.lock();
        if records.contains_key(&record.uid) {
            return Ok(Status::conflict(409));
        }
        records.insert(record.uid.clone(), record.clone());
        Ok(Status::applied(201))
    }

    async fn update(&self, record: &IdentityRecord) -> TargetResponse {
        self.simulate_link().await?;
        match self.records.lock().get_mut(&record.uid) {
            Some(existing) => {
                existing.description = record.description.clone();
                Ok(Status::applied(200))
            }
            None => Ok(Status::not_found(404)),
        }
    }

    async fn delete(&self, record: &IdentityRecord) -> TargetResponse {
        self.simulate_link().await?;
        match self.records.lock().remove(&record.uid) {
            Some(_) => Ok(Status::applied(204)),
            None => Ok(Status::not_found(404)),
        }
    }
}
