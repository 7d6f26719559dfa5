use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, gauge::Gauge},
    registry::Registry,
};

/// Per-kind counters and gauges for store activity.
#[derive(Clone, Debug)]
pub struct StoreMetrics {
    size: Family<KindLabels, Gauge>,
    applies: Family<KindLabels, Counter>,
    deletes: Family<KindLabels, Counter>,
    resets: Family<KindLabels, Counter>,
    errors: Family<KindLabels, Counter>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    kind: String,
}

// === impl StoreMetrics ===

impl StoreMetrics {
    pub fn register(prom: &mut Registry) -> Self {
        let size = Family::default();
        prom.register(
            "store_size",
            "Gauge of the number of objects in the store",
            size.clone(),
        );

        let applies = Family::default();
        prom.register(
            "store_applies",
            "Count of add/modify events applied to the store",
            applies.clone(),
        );

        let deletes = Family::default();
        prom.register(
            "store_deletes",
            "Count of delete events applied to the store",
            deletes.clone(),
        );

        let resets = Family::default();
        prom.register(
            "store_resets",
            "Count of full-list replacements of the store",
            resets.clone(),
        );

        let errors = Family::default();
        prom.register(
            "store_errors",
            "Count of watch errors recorded against the store",
            errors.clone(),
        );

        Self {
            size,
            applies,
            deletes,
            resets,
            errors,
        }
    }

    pub(crate) fn on_apply(&self, kind: &str, size: usize) {
        let labels = KindLabels { kind: kind.into() };
        self.applies.get_or_create(&labels).inc();
        self.size.get_or_create(&labels).set(size as i64);
    }

    pub(crate) fn on_delete(&self, kind: &str, size: usize) {
        let labels = KindLabels { kind: kind.into() };
        self.deletes.get_or_create(&labels).inc();
        self.size.get_or_create(&labels).set(size as i64);
    }

    pub(crate) fn on_reset(&self, kind: &str, size: usize) {
        let labels = KindLabels { kind: kind.into() };
        self.resets.get_or_create(&labels).inc();
        self.size.get_or_create(&labels).set(size as i64);
    }

    pub(crate) fn on_error(&self, kind: &str) {
        self.errors
            .get_or_create(&KindLabels { kind: kind.into() })
            .inc();
    }
}
