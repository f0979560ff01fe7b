//! Shared fixtures for service tests: in-memory stores for the global plane
//! and one region, a static resolver and both services wired like the
//! server does it.

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use url::Url;
use vetchium_db::{ConnectOpts, Db};
use vetchium_domain_verification::{
    DomainVerificationService, StaticTxtResolver, VerificationConfig,
};
use vetchium_federation::{RegionCode, RegionHandle, RegionRegistry};
use vetchium_store::{global, regional};

use super::admin::AdminAuthService;
use super::org::OrgAuthService;
use crate::config::IdentityConfig;

pub(crate) struct TestEnv {
    pub global: Db,
    pub regional: Db,
    pub registry: Arc<RegionRegistry>,
    pub resolver: Arc<StaticTxtResolver>,
    pub org: OrgAuthService,
    pub admin: AdminAuthService,
    pub region: RegionCode,
}

async fn memory_db() -> Db {
    let opts = ConnectOpts {
        max_conns: 1,
        min_conns: 1,
        ..ConnectOpts::default()
    };
    Db::connect("sqlite::memory:", opts).await.expect("connect")
}

pub(crate) async fn env() -> TestEnv {
    let global_db = memory_db().await;
    global::migrations::Migrator::up(global_db.conn(), None)
        .await
        .expect("global migrations");

    let regional_db = memory_db().await;
    regional::migrations::Migrator::up(regional_db.conn(), None)
        .await
        .expect("regional migrations");

    let region = RegionCode::parse("ind1").expect("region code");
    let mut regions = HashMap::new();
    regions.insert(
        region.clone(),
        RegionHandle {
            db: regional_db.clone(),
            base_url: Url::parse("http://ind1.internal:8080").expect("url"),
        },
    );
    let registry = Arc::new(RegionRegistry::new(region.clone(), regions).expect("registry"));

    let resolver = Arc::new(StaticTxtResolver::new());
    let verification = Arc::new(DomainVerificationService::new(
        global_db.clone(),
        Arc::clone(&registry),
        resolver.clone(),
        VerificationConfig::default(),
    ));

    let cfg = Arc::new(IdentityConfig::default());
    let org = OrgAuthService::new(
        global_db.clone(),
        Arc::clone(&registry),
        verification,
        Arc::clone(&cfg),
    );
    let admin = AdminAuthService::new(global_db.clone(), Arc::clone(&registry), cfg);

    TestEnv {
        global: global_db,
        regional: regional_db,
        registry,
        resolver,
        org,
        admin,
        region,
    }
}

impl TestEnv {
    /// The bare signup token most recently issued for `email`.
    pub(crate) async fn signup_token_for(&self, email: &str) -> String {
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
        use vetchium_store::global::entity::signup_token;

        signup_token::Entity::find()
            .filter(signup_token::Column::Email.eq(email))
            .one(self.global.conn())
            .await
            .expect("query signup token")
            .expect("signup token exists")
            .token
    }

    /// The TFA code stored for a bare org TFA token.
    pub(crate) async fn org_tfa_code(&self, bare_token: &str) -> String {
        use sea_orm::EntityTrait;
        use vetchium_store::regional::entity::org_token;

        org_token::Entity::find_by_id(bare_token.to_owned())
            .one(self.regional.conn())
            .await
            .expect("query tfa token")
            .expect("tfa token exists")
            .tfa_code
            .expect("tfa code set")
    }

    /// The bare org token of `kind` most recently issued for a user.
    pub(crate) async fn org_token_of_kind(
        &self,
        kind: vetchium_store::types::TokenKind,
    ) -> String {
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
        use vetchium_store::regional::entity::org_token;

        org_token::Entity::find()
            .filter(org_token::Column::Kind.eq(kind))
            .one(self.regional.conn())
            .await
            .expect("query org token")
            .expect("org token exists")
            .token
    }

    /// The TFA code stored for a bare admin TFA token.
    pub(crate) async fn admin_tfa_code(&self, bare_token: &str) -> String {
        use sea_orm::EntityTrait;
        use vetchium_store::global::entity::admin_token;

        admin_token::Entity::find_by_id(bare_token.to_owned())
            .one(self.global.conn())
            .await
            .expect("query admin tfa token")
            .expect("admin tfa token exists")
            .tfa_code
            .expect("tfa code set")
    }

    /// The bare admin token of `kind` most recently issued.
    pub(crate) async fn admin_token_of_kind(
        &self,
        kind: vetchium_store::types::TokenKind,
    ) -> String {
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
        use vetchium_store::global::entity::admin_token;

        admin_token::Entity::find()
            .filter(admin_token::Column::Kind.eq(kind))
            .one(self.global.conn())
            .await
            .expect("query admin token")
            .expect("admin token exists")
            .token
    }

    /// Run a full org signup for `email`, publishing the TXT proof first.
    /// Returns the wire session token.
    pub(crate) async fn signup_employer(&self, email: &str, password: &str) -> String {
        let domain = email.split('@').nth(1).expect("email domain");
        self.org
            .init_signup(email, self.region.as_str())
            .await
            .expect("init signup");
        let signup_token = self.signup_token_for(email).await;
        self.resolver.publish(
            &vetchium_domain_verification::record_host(domain),
            &signup_token,
        );
        self.org
            .complete_signup(&signup_token, password, None)
            .await
            .expect("complete signup")
            .token
    }
}
