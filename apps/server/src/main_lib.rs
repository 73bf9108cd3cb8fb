use std::sync::Arc;

use anyhow::Context;
use snds_core::{
    contributions::{ContributionService, ContributionServiceTrait},
    needs::{NeedService, NeedServiceTrait},
    plans::{PlanService, PlanServiceTrait},
    propagation::{Clock, StatusPropagationEngine, SystemClock},
    reports::{CollectionRegistry, ReportService, ReportServiceTrait},
    sequences::{SequenceService, SequenceServiceTrait},
    tenants::{NewTenant, PartitionResolver, TenantService, TenantServiceTrait},
};
use snds_storage_sqlite::{
    open_directory, ContributionRepository, NeedRepository, PartitionPools, PlanRepository,
    ReportRepository, SequenceRepository, TenantRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, LogFormat};

pub struct AppState {
    pub resolver: Arc<PartitionResolver>,
    pub partitions: Arc<PartitionPools>,
    pub tenant_service: Arc<dyn TenantServiceTrait>,
    pub plan_service: Arc<dyn PlanServiceTrait>,
    pub need_service: Arc<dyn NeedServiceTrait>,
    pub contribution_service: Arc<dyn ContributionServiceTrait>,
    pub sequence_service: Arc<dyn SequenceServiceTrait>,
    pub report_service: Arc<dyn ReportServiceTrait>,
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    build_state_with_clock(config, Arc::new(SystemClock)).await
}

/// Same as `build_state`, with the clock used for school-year cutoffs.
pub async fn build_state_with_clock(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Arc<AppState>> {
    tracing::info!("Data directory in use: {}", config.data_dir.display());

    let directory = open_directory(&config.data_dir)?;
    let tenant_repo = Arc::new(TenantRepository::new(directory));
    let resolver = Arc::new(PartitionResolver::new(tenant_repo.clone()));
    let tenant_service = Arc::new(TenantService::new(tenant_repo, resolver.clone()));

    if let Some(seed_file) = &config.tenant_seed_file {
        let raw = tokio::fs::read_to_string(seed_file)
            .await
            .with_context(|| format!("Failed to read tenant seed file {}", seed_file.display()))?;
        let tenants: Vec<NewTenant> =
            serde_json::from_str(&raw).context("Tenant seed file is not a JSON array of tenants")?;
        tenant_service.seed_tenants(tenants).await?;
    }

    let partitions = Arc::new(PartitionPools::new(&config.data_dir));
    let plan_repo = Arc::new(PlanRepository::new(partitions.clone()));
    let need_repo = Arc::new(NeedRepository::new(partitions.clone()));
    let contribution_repo = Arc::new(ContributionRepository::new(partitions.clone()));
    let report_repo = Arc::new(ReportRepository::new(partitions.clone()));
    let sequence_service = Arc::new(SequenceService::new(Arc::new(SequenceRepository::new(
        partitions.clone(),
    ))));

    let propagation = Arc::new(
        StatusPropagationEngine::new(
            plan_repo.clone(),
            need_repo.clone(),
            contribution_repo.clone(),
        )
        .with_clock(clock),
    );

    let plan_service = Arc::new(PlanService::new(
        plan_repo.clone(),
        need_repo.clone(),
        sequence_service.clone(),
        propagation.clone(),
        propagation.clone(),
    ));
    let need_service = Arc::new(NeedService::new(
        need_repo.clone(),
        plan_repo.clone(),
        contribution_repo.clone(),
        sequence_service.clone(),
        propagation.clone(),
        propagation.clone(),
    ));
    let contribution_service = Arc::new(ContributionService::new(
        contribution_repo.clone(),
        need_repo.clone(),
        propagation,
    ));

    let registry = Arc::new(CollectionRegistry::with_defaults(
        plan_repo,
        need_repo,
        contribution_repo,
    ));
    let report_service = Arc::new(ReportService::new(report_repo, registry));

    Ok(Arc::new(AppState {
        resolver,
        partitions,
        tenant_service,
        plan_service,
        need_service,
        contribution_service,
        sequence_service,
        report_service,
    }))
}
