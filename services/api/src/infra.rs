use job_portal::config::StorageConfig;
use job_portal::portal::{
    Catalog, CatalogError, InMemoryApplicationStore, InMemoryJobStore, InMemoryProfileStore,
    LifecycleEngine,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type PortalEngine =
    LifecycleEngine<InMemoryJobStore, InMemoryApplicationStore, InMemoryProfileStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn load_catalog(path: Option<&Path>) -> Result<Catalog, CatalogError> {
    match path {
        Some(path) => {
            let catalog = Catalog::from_path(path)?;
            info!(path = %path.display(), jobs = catalog.jobs.len(), "loaded job catalog");
            Ok(catalog)
        }
        None => Ok(Catalog::demo()),
    }
}

pub(crate) fn build_engine(catalog: Catalog, storage: StorageConfig) -> Arc<PortalEngine> {
    let (jobs, profiles) = catalog.into_stores();
    Arc::new(LifecycleEngine::new(
        Arc::new(jobs),
        Arc::new(InMemoryApplicationStore::default()),
        Arc::new(profiles),
        storage,
    ))
}
