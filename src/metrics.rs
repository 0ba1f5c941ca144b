use crate::reconcile::ScanOutcome;
use crate::slip::SignOutcome;
use once_cell::sync::Lazy;
use opentelemetry::{global, metrics::Counter, KeyValue};

pub static METRICS: Lazy<GearMetrics> = Lazy::new(GearMetrics::init);

pub struct GearMetrics {
    pub scans_total: Counter<u64>,
    pub unresolved_scans_total: Counter<u64>,
    pub slips_total: Counter<u64>,
    pub slip_units_total: Counter<u64>,
    pub remote_documents_total: Counter<u64>,
}

impl GearMetrics {
    pub fn init() -> Self {
        let meter = global::meter("eventgear");

        let scans_total = meter
            .u64_counter("eventgear_scans_total")
            .with_description("Scans applied to an event checklist")
            .build();

        let unresolved_scans_total = meter
            .u64_counter("eventgear_unresolved_scans_total")
            .with_description("Scans whose code matched no inventory item")
            .build();

        let slips_total = meter
            .u64_counter("eventgear_slips_total")
            .with_description("Signed hand-off slips created")
            .build();

        let slip_units_total = meter
            .u64_counter("eventgear_slip_units_total")
            .with_description("Units committed to inventory by slips")
            .build();

        let remote_documents_total = meter
            .u64_counter("eventgear_remote_documents_total")
            .with_description("Remote state documents seen by replication")
            .build();

        Self {
            scans_total,
            unresolved_scans_total,
            slips_total,
            slip_units_total,
            remote_documents_total,
        }
    }

    pub fn record_scan(&self, outcome: &ScanOutcome) {
        match outcome {
            ScanOutcome::UnknownEvent => {}
            ScanOutcome::Unresolved { .. } => {
                self.unresolved_scans_total.add(1, &[]);
            }
            ScanOutcome::Recorded { direction, status, .. } => {
                self.scans_total.add(
                    1,
                    &[
                        KeyValue::new("direction", direction.to_string()),
                        KeyValue::new("status", format!("{status:?}").to_uppercase()),
                    ],
                );
            }
        }
    }

    pub fn record_sign(&self, outcome: &SignOutcome) {
        if let SignOutcome::SlipCreated { direction, units, .. } = outcome {
            let attrs = [KeyValue::new("direction", direction.to_string())];
            self.slips_total.add(1, &attrs);
            self.slip_units_total.add(*units, &attrs);
        }
    }

    pub fn record_remote(&self, accepted: bool) {
        let verdict = if accepted { "accepted" } else { "rejected" };
        self.remote_documents_total.add(1, &[KeyValue::new("verdict", verdict)]);
    }
}
