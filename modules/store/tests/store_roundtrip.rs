//! Schema round-trip tests: migrations + queries against in-memory SQLite.

use chrono::{Duration, Utc};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;
use vetchium_db::{ConnectOpts, Db, DbError};
use vetchium_store::types::{roles, DomainStatus, EmailKind, TokenKind, UserStatus};
use vetchium_store::{global, regional};

async fn memory_db() -> Db {
    let opts = ConnectOpts {
        max_conns: 1,
        min_conns: 1,
        ..ConnectOpts::default()
    };
    Db::connect("sqlite::memory:", opts).await.expect("connect")
}

async fn global_db() -> Db {
    let db = memory_db().await;
    global::migrations::Migrator::up(db.conn(), None)
        .await
        .expect("global migrations");
    db
}

async fn regional_db() -> Db {
    let db = memory_db().await;
    regional::migrations::Migrator::up(db.conn(), None)
        .await
        .expect("regional migrations");
    db
}

#[tokio::test]
async fn employer_delete_cascades_to_domains_and_users() {
    let db = global_db().await;
    let c = db.conn();
    let employer_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    global::employers::create(c, employer_id, "acme.test", "ind1")
        .await
        .unwrap();
    global::employers::create_domain(c, "acme.test", employer_id, "ind1", DomainStatus::Verified)
        .await
        .unwrap();
    global::org_users::create(
        c,
        global::org_users::NewGlobalOrgUser {
            id: user_id,
            email_hash: "ab".repeat(32).as_str(),
            employer_id,
            home_region: "ind1",
            status: UserStatus::Active,
            preferred_language: "en",
            full_name: None,
        },
    )
    .await
    .unwrap();

    global::employers::delete(c, employer_id).await.unwrap();

    assert!(global::employers::find_domain(c, "acme.test")
        .await
        .unwrap()
        .is_none());
    assert!(global::org_users::find(c, user_id).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_domain_claim_is_a_unique_violation() {
    let db = global_db().await;
    let c = db.conn();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    global::employers::create(c, a, "acme.test", "ind1").await.unwrap();
    global::employers::create(c, b, "other.test", "ind1").await.unwrap();

    global::employers::create_domain(c, "acme.test", a, "ind1", DomainStatus::Pending)
        .await
        .unwrap();
    let err = global::employers::create_domain(c, "acme.test", b, "ind1", DomainStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation));
}

#[tokio::test]
async fn same_email_hash_allowed_across_employers_but_not_within_one() {
    let db = global_db().await;
    let c = db.conn();
    let hash = "cd".repeat(32);
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    global::employers::create(c, a, "a.test", "ind1").await.unwrap();
    global::employers::create(c, b, "b.test", "ind1").await.unwrap();

    for employer_id in [a, b] {
        global::org_users::create(
            c,
            global::org_users::NewGlobalOrgUser {
                id: Uuid::new_v4(),
                email_hash: &hash,
                employer_id,
                home_region: "ind1",
                status: UserStatus::Active,
                preferred_language: "en",
                full_name: None,
            },
        )
        .await
        .unwrap();
    }

    let err = global::org_users::create(
        c,
        global::org_users::NewGlobalOrgUser {
            id: Uuid::new_v4(),
            email_hash: &hash,
            employer_id: a,
            home_region: "ind1",
            status: UserStatus::Active,
            preferred_language: "en",
            full_name: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation));
}

#[tokio::test]
async fn expired_tokens_are_invisible() {
    let db = global_db().await;
    let c = db.conn();

    global::tokens::create_signup_token(
        c,
        "aa11",
        "founder@acme.test",
        "ind1",
        Utc::now() - Duration::minutes(1),
    )
    .await
    .unwrap();
    global::tokens::create_signup_token(
        c,
        "bb22",
        "founder@acme.test",
        "ind1",
        Utc::now() + Duration::minutes(10),
    )
    .await
    .unwrap();

    assert!(global::tokens::find_signup_token(c, "aa11").await.unwrap().is_none());
    assert!(global::tokens::find_signup_token(c, "bb22").await.unwrap().is_some());
}

#[tokio::test]
async fn role_membership_is_unique_and_lockable() {
    let db = regional_db().await;
    let c = db.conn();
    let employer_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    regional::org_users::create(
        c,
        regional::org_users::NewRegionalOrgUser {
            id: user_id,
            email: "founder@acme.test",
            password_hash: Some("$2b$hash"),
            is_admin: true,
            employer_id,
            status: UserStatus::Active,
            full_name: None,
        },
    )
    .await
    .unwrap();

    regional::org_users::add_role(c, user_id, roles::EMPLOYER_SUPERADMIN)
        .await
        .unwrap();
    let err = regional::org_users::add_role(c, user_id, roles::EMPLOYER_SUPERADMIN)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation));

    let members =
        regional::org_users::lock_active_role_members(c, employer_id, roles::EMPLOYER_SUPERADMIN)
            .await
            .unwrap();
    assert_eq!(members.len(), 1);

    regional::org_users::set_status(c, user_id, UserStatus::Disabled)
        .await
        .unwrap();
    let members =
        regional::org_users::lock_active_role_members(c, employer_id, roles::EMPLOYER_SUPERADMIN)
            .await
            .unwrap();
    assert!(members.is_empty());
}

#[tokio::test]
async fn outbox_preserves_insertion_order() {
    let db = regional_db().await;
    let c = db.conn();

    for subject in ["first", "second", "third"] {
        regional::outbox::enqueue(
            c,
            regional::outbox::NewEmail {
                email_type: EmailKind::OrgTfa,
                to_addr: "founder@acme.test",
                subject,
                text_body: "body",
                html_body: "<p>body</p>",
            },
        )
        .await
        .unwrap();
    }

    let rows = regional::outbox::oldest(c, 10).await.unwrap();
    let subjects: Vec<_> = rows.iter().map(|r| r.subject.as_str()).collect();
    assert_eq!(subjects, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn deleting_a_regional_user_cascades_to_tokens_and_sessions() {
    let db = regional_db().await;
    let c = db.conn();
    let user_id = Uuid::new_v4();

    regional::org_users::create(
        c,
        regional::org_users::NewRegionalOrgUser {
            id: user_id,
            email: "founder@acme.test",
            password_hash: None,
            is_admin: false,
            employer_id: Uuid::new_v4(),
            status: UserStatus::Invited,
            full_name: None,
        },
    )
    .await
    .unwrap();

    let expires = Utc::now() + Duration::hours(1);
    regional::tokens::create_org_token(c, "tok1", TokenKind::Invitation, user_id, None, expires)
        .await
        .unwrap();
    regional::tokens::create_session(c, "sess1", user_id, expires)
        .await
        .unwrap();

    regional::org_users::delete(c, user_id).await.unwrap();

    assert!(
        regional::tokens::find_org_token(c, "tok1", TokenKind::Invitation)
            .await
            .unwrap()
            .is_none()
    );
    assert!(regional::tokens::find_session(c, "sess1").await.unwrap().is_none());
}
