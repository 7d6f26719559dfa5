use crate::{map::MapTask, watch};
use anyhow::{bail, Result};
use clap::Parser;
use prometheus_client::registry::Registry;
use resmap_graph::{crd_gvk, BUILTIN_KINDS};
use resmap_k8s_store::{Scope, StoreCache, StoreMetrics};
use tracing::{info, info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(name = "resmap", about = "A live cluster resource-map controller")]
pub struct Args {
    #[clap(long, default_value = "resmap=info,warn", env = "RESMAP_LOG")]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Name of the cluster being mapped; used for scope labelling only.
    #[clap(long, default_value = "default")]
    cluster: String,

    /// Restricts watches to a single namespace. All namespaces by default.
    #[clap(long)]
    namespace: Option<String>,
}

// === impl Args ===

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            cluster,
            namespace,
        } = self;

        let mut prom = <Registry>::default();
        let store_metrics = StoreMetrics::register(prom.sub_registry_with_prefix("resmap"));
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let scope = Scope { cluster, namespace };
        info!(cluster = %scope.cluster, namespace = ?scope.namespace, "Mapping scope");
        let mut cache = StoreCache::new(scope);

        // Spawn a store per built-in kind.
        let client = runtime.client();
        for builtin in BUILTIN_KINDS {
            let rx = watch::spawn(
                client.clone(),
                cache.drain_watch(),
                cache.scope().namespace.as_deref(),
                builtin.gvk(),
                builtin.plural,
                true,
                store_metrics.clone(),
            );
            cache.insert(builtin.gvk(), rx);
        }

        // CRD discovery is cluster-wide even when resource watches are
        // scoped to a namespace.
        let crds = watch::spawn(
            client.clone(),
            cache.drain_watch(),
            None,
            crd_gvk(),
            "customresourcedefinitions",
            false,
            store_metrics.clone(),
        );

        tokio::spawn(
            MapTask::new(client, cache, crds, store_metrics)
                .run(runtime.shutdown_handle())
                .instrument(info_span!("map")),
        );

        // Block the main thread on the shutdown signal. Once it fires, wait
        // for the background tasks to complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}
