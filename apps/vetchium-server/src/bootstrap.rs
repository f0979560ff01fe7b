//! Wiring: pools, migrations, registry, services, router.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use sea_orm_migration::MigratorTrait;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use vetchium_db::{ConnectOpts, Db};
use vetchium_domain_verification::{DomainVerificationService, HickoryTxtResolver, TxtResolver};
use vetchium_federation::{RegionCode, RegionHandle, RegionProxy, RegionRegistry};
use vetchium_identity::api::rest::{router, ApiState};
use vetchium_identity::{AdminAuthService, OrgAuthService};
use vetchium_store::{global, regional};

use crate::config::AppConfig;

/// Connect every pool, run migrations, and assemble the HTTP router.
///
/// # Errors
/// Returns an error when a pool cannot be reached, a migration fails or the
/// configuration is inconsistent (e.g. `current_region` not configured).
pub async fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let global_db = Db::connect(&config.global_db.dsn, ConnectOpts::default())
        .await
        .context("connecting global database")?;
    global::migrations::Migrator::up(global_db.conn(), None)
        .await
        .context("migrating global schema")?;
    tracing::info!("global store ready");

    let mut regions = HashMap::new();
    for (code, region_cfg) in &config.regions {
        let region = RegionCode::parse(code)
            .map_err(|e| anyhow::anyhow!("invalid region code '{code}': {e}"))?;
        let db = Db::connect(&region_cfg.dsn, ConnectOpts::default())
            .await
            .with_context(|| format!("connecting regional database for {code}"))?;
        regional::migrations::Migrator::up(db.conn(), None)
            .await
            .with_context(|| format!("migrating regional schema for {code}"))?;
        tracing::info!(region = %code, "regional store ready");
        regions.insert(
            region,
            RegionHandle {
                db,
                base_url: region_cfg.base_url.clone(),
            },
        );
    }

    let current = RegionCode::parse(&config.current_region)
        .map_err(|e| anyhow::anyhow!("invalid current_region: {e}"))?;
    let registry = Arc::new(
        RegionRegistry::new(current, regions).context("building region registry")?,
    );
    tracing::info!(
        current_region = %config.current_region,
        regions = config.regions.len(),
        "region registry built"
    );

    let resolver: Arc<dyn TxtResolver> = Arc::new(HickoryTxtResolver::new(config.dns.timeout));
    let verification = Arc::new(DomainVerificationService::new(
        global_db.clone(),
        Arc::clone(&registry),
        resolver,
        config.verification(),
    ));

    let identity_cfg = Arc::new(config.identity());
    let org = Arc::new(OrgAuthService::new(
        global_db.clone(),
        Arc::clone(&registry),
        Arc::clone(&verification),
        Arc::clone(&identity_cfg),
    ));
    let admin = Arc::new(AdminAuthService::new(
        global_db.clone(),
        Arc::clone(&registry),
        identity_cfg,
    ));

    let proxy = Arc::new(
        RegionProxy::new(config.proxy.timeout).context("building cross-region proxy client")?,
    );

    let state = ApiState {
        org,
        admin,
        verification,
        registry,
        proxy,
        global: global_db,
        body_limit: config.server.body_limit,
    };

    Ok(router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.server.request_timeout))
        .layer(RequestBodyLimitLayer::new(config.server.body_limit)))
}
