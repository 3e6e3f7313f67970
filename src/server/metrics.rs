use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ServerMetrics {
    sign_ins: Arc<AtomicU64>,
    attestations: Arc<AtomicU64>,
    writes_accepted: Arc<AtomicU64>,
    writes_rejected: Arc<AtomicU64>,
    queries: Arc<AtomicU64>,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_sign_ins(&self) {
        self.sign_ins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_attestations(&self) {
        self.attestations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_writes_accepted(&self) {
        self.writes_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_writes_rejected(&self) {
        self.writes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_sign_ins(&self) -> u64 {
        self.sign_ins.load(Ordering::Relaxed)
    }

    pub fn get_writes_accepted(&self) -> u64 {
        self.writes_accepted.load(Ordering::Relaxed)
    }

    pub fn get_writes_rejected(&self) -> u64 {
        self.writes_rejected.load(Ordering::Relaxed)
    }

    pub fn get_queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> String {
        format!(
            "sign-ins={} attestations={} writes={}/{} rejected queries={}",
            self.get_sign_ins(),
            self.attestations.load(Ordering::Relaxed),
            self.get_writes_accepted(),
            self.get_writes_rejected(),
            self.get_queries()
        )
    }
}
