//! Router-level tests: the literal end-to-end scenarios, driven over HTTP
//! against in-memory stores.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use sea_orm_migration::MigratorTrait;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;
use vetchium_db::{ConnectOpts, Db};
use vetchium_domain_verification::{
    record_host, DomainVerificationService, StaticTxtResolver, VerificationConfig,
};
use vetchium_federation::{RegionCode, RegionHandle, RegionProxy, RegionRegistry};
use vetchium_identity::api::rest::{router, ApiState};
use vetchium_identity::{AdminAuthService, IdentityConfig, OrgAuthService};
use vetchium_store::types::{TokenKind, UserStatus};
use vetchium_store::{global, regional};

const PASSWORD: &str = "Hunter22Hunter22!";

struct TestApp {
    router: Router,
    global: Db,
    regional: Db,
    resolver: Arc<StaticTxtResolver>,
}

async fn memory_db() -> Db {
    let opts = ConnectOpts {
        max_conns: 1,
        min_conns: 1,
        ..ConnectOpts::default()
    };
    Db::connect("sqlite::memory:", opts).await.expect("connect")
}

async fn app() -> TestApp {
    let global_db = memory_db().await;
    global::migrations::Migrator::up(global_db.conn(), None)
        .await
        .expect("global migrations");
    let regional_db = memory_db().await;
    regional::migrations::Migrator::up(regional_db.conn(), None)
        .await
        .expect("regional migrations");

    let region = RegionCode::parse("ind1").expect("region");
    let mut regions = HashMap::new();
    regions.insert(
        region.clone(),
        RegionHandle {
            db: regional_db.clone(),
            base_url: Url::parse("http://ind1.internal:8080").expect("url"),
        },
    );
    let registry = Arc::new(RegionRegistry::new(region, regions).expect("registry"));

    let resolver = Arc::new(StaticTxtResolver::new());
    let verification = Arc::new(DomainVerificationService::new(
        global_db.clone(),
        Arc::clone(&registry),
        resolver.clone(),
        VerificationConfig::default(),
    ));
    let cfg = Arc::new(IdentityConfig::default());

    let state = ApiState {
        org: Arc::new(OrgAuthService::new(
            global_db.clone(),
            Arc::clone(&registry),
            Arc::clone(&verification),
            Arc::clone(&cfg),
        )),
        admin: Arc::new(AdminAuthService::new(
            global_db.clone(),
            Arc::clone(&registry),
            Arc::clone(&cfg),
        )),
        verification,
        registry,
        proxy: Arc::new(RegionProxy::new(std::time::Duration::from_secs(5)).expect("proxy")),
        global: global_db.clone(),
        body_limit: 1024 * 1024,
    };

    TestApp {
        router: router(state),
        global: global_db,
        regional: regional_db,
        resolver,
    }
}

impl TestApp {
    async fn post(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    async fn signup_token_for(&self, email: &str) -> String {
        use vetchium_store::global::entity::signup_token;
        signup_token::Entity::find()
            .filter(signup_token::Column::Email.eq(email))
            .one(self.global.conn())
            .await
            .expect("query")
            .expect("token exists")
            .token
    }

    async fn org_tfa_code(&self, bare: &str) -> String {
        use vetchium_store::regional::entity::org_token;
        org_token::Entity::find_by_id(bare.to_owned())
            .one(self.regional.conn())
            .await
            .expect("query")
            .expect("token exists")
            .tfa_code
            .expect("code set")
    }

    async fn admin_token_of_kind(&self, kind: TokenKind) -> String {
        use vetchium_store::global::entity::admin_token;
        admin_token::Entity::find()
            .filter(admin_token::Column::Kind.eq(kind))
            .one(self.global.conn())
            .await
            .expect("query")
            .expect("token exists")
            .token
    }

    async fn admin_tfa_code(&self, bare: &str) -> String {
        use vetchium_store::global::entity::admin_token;
        admin_token::Entity::find_by_id(bare.to_owned())
            .one(self.global.conn())
            .await
            .expect("query")
            .expect("token exists")
            .tfa_code
            .expect("code set")
    }

    /// HTTP signup flow for a fresh employer; returns the wire session
    /// token.
    async fn signup(&self, email: &str) -> String {
        let domain = email.split('@').nth(1).expect("domain");
        let (status, _) = self
            .post(
                "/org/init-signup",
                None,
                serde_json::json!({"email": email, "home_region": "ind1"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let token = self.signup_token_for(email).await;
        self.resolver.publish(&record_host(domain), &token);

        let (status, body) = self
            .post(
                "/org/complete-signup",
                None,
                serde_json::json!({"signup_token": token, "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_token"].as_str().expect("session token").to_owned()
    }

    async fn seed_admin(&self, email: &str) {
        let id = Uuid::new_v4();
        global::admin_users::create(self.global.conn(), id, email, UserStatus::Invited, "en")
            .await
            .expect("create admin");
        let hash = bcrypt::hash(PASSWORD, 6).expect("hash");
        global::admin_users::activate(self.global.conn(), id, "Seed Admin", "en", &hash)
            .await
            .expect("activate");
        global::admin_users::add_role(
            self.global.conn(),
            id,
            vetchium_store::types::roles::ADMIN_SUPERADMIN,
        )
        .await
        .expect("grant role");
    }

    /// HTTP admin login + TFA; returns the bare session token.
    async fn admin_session(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/admin/login",
                None,
                serde_json::json!({"email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let tfa_token = body["tfa_token"].as_str().expect("tfa token").to_owned();
        let code = self.admin_tfa_code(&tfa_token).await;

        let (status, body) = self
            .post(
                "/admin/tfa",
                None,
                serde_json::json!({"tfa_token": tfa_token, "tfa_code": code}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["session_token"].as_str().expect("session").to_owned()
    }
}

fn assert_wire_token(token: &str, prefix: &str) {
    let (p, bare) = token.split_once('-').expect("prefixed");
    assert_eq!(p, prefix);
    assert_eq!(bare.len(), 64);
    assert!(bare
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
}

#[tokio::test]
async fn signup_flow_over_http_yields_superadmin_session() {
    let app = app().await;
    let session = app.signup("founder@acme.test").await;
    assert_wire_token(&session, "IND1");

    let (status, body) = app.post("/org/my-info", Some(&session), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employer_name"], "acme.test");
    assert_eq!(body["is_admin"], true);
    assert!(body["roles"]
        .as_array()
        .expect("roles array")
        .iter()
        .any(|r| r == "employer:superadmin"));
}

#[tokio::test]
async fn signup_without_txt_record_is_422_and_creates_no_employer() {
    let app = app().await;
    let (status, _) = app
        .post(
            "/org/init-signup",
            None,
            serde_json::json!({"email": "founder@acme.test", "home_region": "ind1"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let token = app.signup_token_for("founder@acme.test").await;
    let (status, _) = app
        .post(
            "/org/complete-signup",
            None,
            serde_json::json!({"signup_token": token, "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(global::employers::find_domain(app.global.conn(), "acme.test")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn tfa_rejects_wrong_code_then_accepts_right_one() {
    let app = app().await;
    app.signup("founder@acme.test").await;

    let (status, body) = app
        .post(
            "/org/login",
            None,
            serde_json::json!({"email": "founder@acme.test", "domain": "acme.test", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let tfa_token = body["tfa_token"].as_str().expect("tfa token").to_owned();
    assert_wire_token(&tfa_token, "IND1");

    let bare = tfa_token.split_once('-').unwrap().1;
    let code = app.org_tfa_code(bare).await;

    let (status, _) = app
        .post(
            "/org/tfa",
            None,
            serde_json::json!({"tfa_token": tfa_token, "tfa_code": "000000", "remember_me": false}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/org/tfa",
            None,
            serde_json::json!({"tfa_token": tfa_token, "tfa_code": code, "remember_me": false}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_wire_token(body["session_token"].as_str().unwrap(), "IND1");
}

#[tokio::test]
async fn missing_or_malformed_bearer_is_401() {
    let app = app().await;

    let (status, _) = app.post("/org/my-info", None, serde_json::json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let bogus = format!("XXX9-{}", "a".repeat(64));
    let (status, _) = app
        .post("/org/my-info", Some(&bogus), serde_json::json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let bare = "b".repeat(64);
    let (status, _) = app
        .post("/org/my-info", Some(&bare), serde_json::json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_reset_for_ghost_user_is_generic_and_side_effect_free() {
    let app = app().await;
    app.signup("founder@acme.test").await;

    let (status, body) = app
        .post(
            "/org/request-password-reset",
            None,
            serde_json::json!({"email": "ghost@acme.test", "domain": "acme.test"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status_real, body_real) = app
        .post(
            "/org/request-password-reset",
            None,
            serde_json::json!({"email": "founder@acme.test", "domain": "acme.test"}),
        )
        .await;
    assert_eq!(status_real, StatusCode::OK);
    // Indistinguishable responses.
    assert_eq!(body, body_real);

    // The ghost produced no reset token.
    use vetchium_store::regional::entity::org_token;
    let resets = org_token::Entity::find()
        .filter(org_token::Column::Kind.eq(TokenKind::PasswordReset))
        .all(app.regional.conn())
        .await
        .unwrap();
    assert_eq!(resets.len(), 1);
}

#[tokio::test]
async fn last_admin_guard_over_http() {
    let app = app().await;
    app.seed_admin("a1@vetchium.test").await;
    let a1_session = app.admin_session("a1@vetchium.test").await;

    // Sole ACTIVE admin cannot disable themself.
    let (status, body) = app
        .post(
            "/admin/disable-admin",
            Some(&a1_session),
            serde_json::json!({"email": "a1@vetchium.test"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, serde_json::json!({"error": "Cannot disable last admin user"}));

    // Bring in a second admin through the invitation flow.
    let (status, _) = app
        .post(
            "/admin/invite-admin",
            Some(&a1_session),
            serde_json::json!({"email": "a2@vetchium.test"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let invitation = app.admin_token_of_kind(TokenKind::Invitation).await;
    let (status, _) = app
        .post(
            "/admin/complete-setup",
            None,
            serde_json::json!({
                "invitation_token": invitation,
                "full_name": "Admin Two",
                "password": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Now the self-disable goes through, and the old session dies with it.
    let (status, _) = app
        .post(
            "/admin/disable-admin",
            Some(&a1_session),
            serde_json::json!({"email": "a1@vetchium.test"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/admin/my-info", Some(&a1_session), serde_json::json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invite_requires_role_and_duplicate_domain_claim_conflicts() {
    let app = app().await;
    let founder = app.signup("founder@acme.test").await;

    // Founder invites a teammate (is_admin grants everything).
    let (status, _) = app
        .post(
            "/org/invite-user",
            Some(&founder),
            serde_json::json!({"email": "teammate@acme.test"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    use vetchium_store::regional::entity::org_token;
    let invitation = org_token::Entity::find()
        .filter(org_token::Column::Kind.eq(TokenKind::Invitation))
        .one(app.regional.conn())
        .await
        .unwrap()
        .expect("invitation token")
        .token;
    let wire_invitation = format!("IND1-{invitation}");
    let (status, _) = app
        .post(
            "/org/complete-invite",
            None,
            serde_json::json!({
                "invitation_token": wire_invitation,
                "full_name": "Team Mate",
                "password": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The plain teammate holds no role: invite-user is forbidden.
    let (status, body) = app
        .post(
            "/org/login",
            None,
            serde_json::json!({"email": "teammate@acme.test", "domain": "acme.test", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let tfa_token = body["tfa_token"].as_str().unwrap().to_owned();
    let code = app.org_tfa_code(tfa_token.split_once('-').unwrap().1).await;
    let (_, body) = app
        .post(
            "/org/tfa",
            None,
            serde_json::json!({"tfa_token": tfa_token, "tfa_code": code}),
        )
        .await;
    let teammate_session = body["session_token"].as_str().unwrap().to_owned();

    let (status, _) = app
        .post(
            "/org/invite-user",
            Some(&teammate_session),
            serde_json::json!({"email": "third@acme.test"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The signup domain is already claimed: re-claiming conflicts.
    let (status, _) = app
        .post(
            "/org/claim-domain",
            Some(&founder),
            serde_json::json!({"domain": "acme.test"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A new domain claim succeeds and verifies once the record exists.
    let (status, body) = app
        .post(
            "/org/claim-domain",
            Some(&founder),
            serde_json::json!({"domain": "careers.acme.test"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let proof = body["verification_token"].as_str().unwrap().to_owned();

    let (status, body) = app
        .post(
            "/org/verify-domain",
            Some(&founder),
            serde_json::json!({"domain": "careers.acme.test"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");

    app.resolver.publish(&record_host("careers.acme.test"), &proof);
    let (status, body) = app
        .post(
            "/org/verify-domain",
            Some(&founder),
            serde_json::json!({"domain": "careers.acme.test"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "VERIFIED");
}
