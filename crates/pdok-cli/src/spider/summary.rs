use pdok_harvest::FetchFailure;

/// Outcome counts of one spider run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HarvestSummary {
    pub services: usize,
    pub layers: usize,
    /// Services without layers, restricted ones included.
    pub failed: usize,
    /// Restricted services left out on purpose.
    pub skipped: usize,
    /// Capabilities URLs that could not be harvested, in pipeline order.
    /// Restricted services are counted in `failed` but not listed here.
    pub failed_urls: Vec<String>,
}

impl HarvestSummary {
    pub(crate) fn new(services: usize, layers: usize, failures: &[FetchFailure]) -> Self {
        let skipped = failures.iter().filter(|f| f.is_skipped()).count();
        let failed_urls = failures
            .iter()
            .filter(|f| !f.is_skipped())
            .map(|f| f.url.clone())
            .collect();
        Self {
            services,
            layers,
            failed: failures.len(),
            skipped,
            failed_urls,
        }
    }

    pub(crate) fn headline(&self) -> String {
        format!("indexed {} services with {} layers", self.services, self.layers)
    }

    pub(crate) fn log(&self) {
        tracing::info!("{}", self.headline());
        tracing::info!(failed = self.failed, "failed services");
        tracing::info!(skipped = self.skipped, "skipped restricted services");
        for url in &self.failed_urls {
            tracing::info!(%url, "failed service");
        }
    }
}
