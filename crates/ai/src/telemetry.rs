//! Operation ledger: per-call telemetry with cost accounting.
//!
//! An [`OperationLedger`] is constructed explicitly at startup and
//! passed (via `Arc`) to every gateway — there is no global singleton,
//! so tests can run in parallel against independent ledgers.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Serialize;

use maison_core::pricing::{estimate_cost, TokenUsage};

/// How many completed operation records are retained before FIFO
/// eviction kicks in.
pub const DEFAULT_COMPLETED_CAPACITY: usize = 500;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One gateway call, from start to completion or failure.
#[derive(Debug, Clone, Serialize)]
pub struct OperationRecord {
    pub operation_id: String,
    pub function_id: String,
    pub model: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub time_to_first_chunk_ms: Option<u64>,
    pub usage: TokenUsage,
    pub estimated_cost_usd: f64,
    pub finish_reason: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub retry_attempts: Option<u32>,
}

struct InFlight {
    record: OperationRecord,
    started: Instant,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Per-function or per-model aggregate row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupStats {
    pub operations: usize,
    pub failed: usize,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
}

/// Read-only reduction over the completed ring.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub total_operations: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_usage: TokenUsage,
    pub total_cost_usd: f64,
    pub avg_duration_ms: f64,
    pub avg_time_to_first_chunk_ms: Option<f64>,
    pub by_function: BTreeMap<String, GroupStats>,
    pub by_model: BTreeMap<String, GroupStats>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

struct Inner {
    in_flight: HashMap<String, InFlight>,
    completed: VecDeque<OperationRecord>,
    capacity: usize,
}

/// Process-wide operation ledger (explicitly constructed, `Arc`-shared).
pub struct OperationLedger {
    inner: Mutex<Inner>,
}

impl Default for OperationLedger {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETED_CAPACITY)
    }
}

impl OperationLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                in_flight: HashMap::new(),
                completed: VecDeque::with_capacity(capacity.min(1024)),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Build a collision-resistant operation id: function id, millisecond
    /// timestamp, and a random suffix. Uniqueness is the caller's
    /// contract — a duplicate id silently overwrites the in-flight entry.
    pub fn new_operation_id(function_id: &str) -> String {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        format!("{function_id}-{}-{suffix}", Utc::now().timestamp_millis())
    }

    /// Insert a new in-flight record. Calling twice with the same id
    /// overwrites the first entry without error.
    pub fn start(&self, operation_id: &str, function_id: &str, model: &str) {
        let record = OperationRecord {
            operation_id: operation_id.to_string(),
            function_id: function_id.to_string(),
            model: model.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
            time_to_first_chunk_ms: None,
            usage: TokenUsage::default(),
            estimated_cost_usd: 0.0,
            finish_reason: None,
            success: false,
            error: None,
            retry_attempts: None,
        };
        let mut inner = self.lock();
        inner.in_flight.insert(
            operation_id.to_string(),
            InFlight {
                record,
                started: Instant::now(),
            },
        );
    }

    /// Record time-to-first-chunk for a streaming call. First write
    /// wins; later calls are no-ops.
    pub fn record_first_chunk(&self, operation_id: &str) {
        let mut inner = self.lock();
        if let Some(op) = inner.in_flight.get_mut(operation_id) {
            if op.record.time_to_first_chunk_ms.is_none() {
                op.record.time_to_first_chunk_ms = Some(op.started.elapsed().as_millis() as u64);
            }
        }
    }

    /// Finalize a successful operation. Unknown ids (already completed,
    /// evicted, or never started) return `None` — not an error.
    pub fn complete(
        &self,
        operation_id: &str,
        usage: TokenUsage,
        finish_reason: Option<&str>,
    ) -> Option<OperationRecord> {
        self.finish(operation_id, |record| {
            record.usage = usage;
            record.estimated_cost_usd = estimate_cost(&record.model, &usage);
            record.finish_reason = finish_reason.map(str::to_string);
            record.success = true;
        })
    }

    /// Finalize a failed operation.
    pub fn fail(
        &self,
        operation_id: &str,
        error: &str,
        retry_attempts: Option<u32>,
    ) -> Option<OperationRecord> {
        self.finish(operation_id, |record| {
            record.success = false;
            record.error = Some(error.to_string());
            record.retry_attempts = retry_attempts;
        })
    }

    fn finish(
        &self,
        operation_id: &str,
        mutate: impl FnOnce(&mut OperationRecord),
    ) -> Option<OperationRecord> {
        let mut inner = self.lock();
        let mut op = inner.in_flight.remove(operation_id)?;
        op.record.completed_at = Some(Utc::now());
        op.record.duration_ms = Some(op.started.elapsed().as_millis() as u64);
        mutate(&mut op.record);

        if inner.completed.len() >= inner.capacity {
            inner.completed.pop_front();
        }
        inner.completed.push_back(op.record.clone());
        Some(op.record)
    }

    /// Pure read-only reduction over completed records.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.lock();
        let mut snap = MetricsSnapshot::default();
        let mut duration_sum: u64 = 0;
        let mut ttfc_sum: u64 = 0;
        let mut ttfc_count: usize = 0;

        for record in &inner.completed {
            snap.total_operations += 1;
            if record.success {
                snap.succeeded += 1;
            } else {
                snap.failed += 1;
            }
            snap.total_usage.accumulate(&record.usage);
            snap.total_cost_usd += record.estimated_cost_usd;
            duration_sum += record.duration_ms.unwrap_or(0);
            if let Some(ttfc) = record.time_to_first_chunk_ms {
                ttfc_sum += ttfc;
                ttfc_count += 1;
            }

            for (key, map) in [
                (&record.function_id, &mut snap.by_function),
                (&record.model, &mut snap.by_model),
            ] {
                let stats = map.entry(key.clone()).or_default();
                stats.operations += 1;
                if !record.success {
                    stats.failed += 1;
                }
                stats.total_tokens += record.usage.total_tokens;
                stats.total_cost_usd += record.estimated_cost_usd;
            }
        }

        if snap.total_operations > 0 {
            snap.avg_duration_ms = duration_sum as f64 / snap.total_operations as f64;
        }
        if ttfc_count > 0 {
            snap.avg_time_to_first_chunk_ms = Some(ttfc_sum as f64 / ttfc_count as f64);
        }
        snap
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("ledger lock poisoned")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_moves_record_out_of_flight() {
        let ledger = OperationLedger::default();
        ledger.start("op-1", "generate_style_content", "gemini-2.0-flash");
        let record = ledger
            .complete("op-1", TokenUsage::new(100, 50), Some("STOP"))
            .unwrap();
        assert!(record.success);
        assert_eq!(record.usage.total_tokens, 150);
        assert!(record.duration_ms.is_some());
        // A second completion of the same id is a no-op.
        assert!(ledger.complete("op-1", TokenUsage::default(), None).is_none());
    }

    #[test]
    fn unknown_id_completion_is_none() {
        let ledger = OperationLedger::default();
        assert!(ledger.complete("ghost", TokenUsage::default(), None).is_none());
    }

    #[test]
    fn fail_marks_record_unsuccessful() {
        let ledger = OperationLedger::default();
        ledger.start("op-1", "generate_images", "gemini-2.0-flash");
        let record = ledger.fail("op-1", "rate limited", Some(3)).unwrap();
        assert!(!record.success);
        assert_eq!(record.error.as_deref(), Some("rate limited"));
        assert_eq!(record.retry_attempts, Some(3));
    }

    #[test]
    fn first_chunk_first_write_wins() {
        let ledger = OperationLedger::default();
        ledger.start("op-1", "f", "m");
        ledger.record_first_chunk("op-1");
        let first = {
            let inner = ledger.lock();
            inner.in_flight["op-1"].record.time_to_first_chunk_ms
        };
        ledger.record_first_chunk("op-1");
        let second = {
            let inner = ledger.lock();
            inner.in_flight["op-1"].record.time_to_first_chunk_ms
        };
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn ring_buffer_evicts_oldest_first() {
        let ledger = OperationLedger::new(2);
        for i in 0..3 {
            let id = format!("op-{i}");
            ledger.start(&id, "f", "m");
            ledger.complete(&id, TokenUsage::default(), None);
        }
        let snap = ledger.snapshot();
        assert_eq!(snap.total_operations, 2);
        let inner = ledger.lock();
        assert_eq!(inner.completed[0].operation_id, "op-1");
        assert_eq!(inner.completed[1].operation_id, "op-2");
    }

    #[test]
    fn snapshot_accumulates_usage_and_analytic_cost() {
        let ledger = OperationLedger::default();
        for i in 0..2 {
            let id = format!("op-{i}");
            ledger.start(&id, "generate_style_content", "gemini-1.5-pro");
            ledger.complete(&id, TokenUsage::new(100, 50), Some("STOP"));
        }
        let snap = ledger.snapshot();
        assert_eq!(snap.total_usage.total_tokens, 300);
        let per_call = 0.1 * 0.00125 + 0.05 * 0.005;
        assert!((snap.total_cost_usd - 2.0 * per_call).abs() < 1e-12);
    }

    #[test]
    fn snapshot_breaks_down_by_function_and_model() {
        let ledger = OperationLedger::default();
        ledger.start("a", "select_style_pair", "gemini-2.0-flash");
        ledger.complete("a", TokenUsage::new(10, 5), None);
        ledger.start("b", "match_materials", "gemini-2.0-flash");
        ledger.fail("b", "boom", None);

        let snap = ledger.snapshot();
        assert_eq!(snap.by_function.len(), 2);
        assert_eq!(snap.by_function["match_materials"].failed, 1);
        assert_eq!(snap.by_model["gemini-2.0-flash"].operations, 2);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.failed, 1);
    }

    #[test]
    fn duplicate_start_overwrites_silently() {
        let ledger = OperationLedger::default();
        ledger.start("op-1", "first", "m");
        ledger.start("op-1", "second", "m");
        let record = ledger.complete("op-1", TokenUsage::default(), None).unwrap();
        assert_eq!(record.function_id, "second");
    }

    #[test]
    fn operation_ids_are_distinct() {
        let a = OperationLedger::new_operation_id("f");
        let b = OperationLedger::new_operation_id("f");
        assert_ne!(a, b);
        assert!(a.starts_with("f-"));
    }
}
