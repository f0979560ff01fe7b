use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};
use vetchium_federation::token;
use vetchium_store::global::{self, employers};
use vetchium_store::regional;
use vetchium_store::types::{roles, TokenKind, UserStatus};

use crate::domain::context::load_org_context;
use crate::domain::error::DomainError;
use crate::domain::test_support::env;

const PASSWORD: &str = "Hunter22Hunter22!";

fn bare(wire: &str) -> &str {
    wire.split_once('-').expect("prefixed token").1
}

#[tokio::test]
async fn complete_signup_bootstraps_employer_admin_and_session() {
    let env = env().await;
    let wire = env.signup_employer("founder@acme.test", PASSWORD).await;

    assert!(wire.starts_with("IND1-"));
    let bare_token = bare(&wire);
    assert_eq!(bare_token.len(), 64);
    assert!(bare_token.bytes().all(|b| b.is_ascii_hexdigit()));

    let ctx = load_org_context(&env.global, &env.registry, &env.region, bare_token)
        .await
        .expect("session resolves");
    assert!(ctx.is_admin);
    assert!(ctx.roles.iter().any(|r| r == roles::EMPLOYER_SUPERADMIN));
    assert_eq!(ctx.status, UserStatus::Active);
    assert_eq!(ctx.employer_name, "acme.test");

    let routing = employers::find_domain(env.global.conn(), "acme.test")
        .await
        .unwrap()
        .expect("routing record");
    assert_eq!(routing.region, "ind1");
}

#[tokio::test]
async fn complete_signup_without_txt_record_is_rejected_and_creates_nothing() {
    let env = env().await;
    env.org
        .init_signup("founder@acme.test", "ind1")
        .await
        .unwrap();
    let signup_token = env.signup_token_for("founder@acme.test").await;

    let err = env
        .org
        .complete_signup(&signup_token, PASSWORD, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));

    assert!(employers::find_domain(env.global.conn(), "acme.test")
        .await
        .unwrap()
        .is_none());
    let employer_count = global::entity::employer::Entity::find()
        .count(env.global.conn())
        .await
        .unwrap();
    assert_eq!(employer_count, 0);
}

#[tokio::test]
async fn init_signup_validates_input() {
    let env = env().await;

    let err = env
        .org
        .init_signup("founder@gmail.com", "ind1")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "email"));

    let err = env
        .org
        .init_signup("founder@acme.test", "mars")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "home_region"));

    let err = env
        .org
        .init_signup("not-an-email", "ind1")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
}

#[tokio::test]
async fn duplicate_signup_for_registered_email_conflicts() {
    let env = env().await;
    env.signup_employer("founder@acme.test", PASSWORD).await;

    let err = env
        .org
        .init_signup("founder@acme.test", "ind1")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn consumed_signup_token_cannot_complete_twice() {
    let env = env().await;
    env.org
        .init_signup("founder@acme.test", "ind1")
        .await
        .unwrap();
    let signup_token = env.signup_token_for("founder@acme.test").await;
    env.resolver.publish(
        &vetchium_domain_verification::record_host("acme.test"),
        &signup_token,
    );
    env.org
        .complete_signup(&signup_token, PASSWORD, None)
        .await
        .unwrap();

    let err = env
        .org
        .complete_signup(&signup_token, PASSWORD, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));
}

#[tokio::test]
async fn regional_failure_during_signup_compensates_global_identity() {
    let env = env().await;
    env.org
        .init_signup("founder@acme.test", "ind1")
        .await
        .unwrap();
    let signup_token = env.signup_token_for("founder@acme.test").await;
    env.resolver.publish(
        &vetchium_domain_verification::record_host("acme.test"),
        &signup_token,
    );

    // Sabotage the regional schema so the regional transaction fails after
    // the global one committed.
    env.regional
        .conn()
        .execute_unprepared("DROP TABLE org_sessions")
        .await
        .unwrap();

    let err = env
        .org
        .complete_signup(&signup_token, PASSWORD, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Database(_)));

    // The compensator deleted the employer; the cascade removed the routing
    // record and the global user projection.
    assert!(employers::find_domain(env.global.conn(), "acme.test")
        .await
        .unwrap()
        .is_none());
    let hash = token::hash_email("founder@acme.test");
    assert!(
        global::org_users::find_any_by_email_hash(env.global.conn(), &hash)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn login_and_tfa_mint_independent_sessions() {
    let env = env().await;
    env.signup_employer("founder@acme.test", PASSWORD).await;

    let grant = env
        .org
        .login("founder@acme.test", "acme.test", PASSWORD)
        .await
        .expect("login");
    assert!(grant.token.starts_with("IND1-"));
    let tfa_bare = bare(&grant.token).to_owned();
    let code = env.org_tfa_code(&tfa_bare).await;

    let err = env
        .org
        .verify_tfa(&env.region, &tfa_bare, "000000", false)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::WrongTfaCode));

    let first = env
        .org
        .verify_tfa(&env.region, &tfa_bare, &code, false)
        .await
        .expect("first verification");

    // The TFA token survives; a retry mints a second, independent session.
    let second = env
        .org
        .verify_tfa(&env.region, &tfa_bare, &code, true)
        .await
        .expect("second verification");
    assert_ne!(first.token, second.token);
    assert!(second.expires_at > first.expires_at);

    for grant in [&first, &second] {
        load_org_context(&env.global, &env.registry, &env.region, bare(&grant.token))
            .await
            .expect("both sessions resolve");
    }
}

#[tokio::test]
async fn login_rejects_bad_credentials_and_states() {
    let env = env().await;
    env.signup_employer("founder@acme.test", PASSWORD).await;

    let err = env
        .org
        .login("founder@acme.test", "acme.test", "wrong-password-123")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));

    let err = env
        .org
        .login("ghost@acme.test", "acme.test", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));

    let err = env
        .org
        .login("founder@acme.test", "unclaimed.test", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));
}

#[tokio::test]
async fn invite_complete_and_single_use_token() {
    let env = env().await;
    let wire = env.signup_employer("founder@acme.test", PASSWORD).await;
    let ctx = load_org_context(&env.global, &env.registry, &env.region, bare(&wire))
        .await
        .unwrap();

    env.org
        .invite_user(&ctx, "teammate@acme.test")
        .await
        .expect("invite");

    // Inviting the same address again conflicts.
    let err = env
        .org
        .invite_user(&ctx, "teammate@acme.test")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let invitation = env.org_token_of_kind(TokenKind::Invitation).await;
    env.org
        .complete_invite(&env.region, &invitation, "Team Mate", PASSWORD, Some("en"))
        .await
        .expect("complete invite");

    // The token was single-use.
    let err = env
        .org
        .complete_invite(&env.region, &invitation, "Team Mate", PASSWORD, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));

    // The new teammate can log in and is not an admin.
    let grant = env
        .org
        .login("teammate@acme.test", "acme.test", PASSWORD)
        .await
        .expect("teammate login");
    let code = env.org_tfa_code(bare(&grant.token)).await;
    let session = env
        .org
        .verify_tfa(&env.region, bare(&grant.token), &code, false)
        .await
        .unwrap();
    let teammate_ctx =
        load_org_context(&env.global, &env.registry, &env.region, bare(&session.token))
            .await
            .unwrap();
    assert!(!teammate_ctx.is_admin);
    assert!(teammate_ctx.roles.is_empty());
}

#[tokio::test]
async fn password_reset_is_enumeration_proof() {
    let env = env().await;
    env.signup_employer("founder@acme.test", PASSWORD).await;

    // Ghost user: generic success, no token, no email.
    env.org
        .request_password_reset("ghost@acme.test", "acme.test")
        .await
        .expect("generic response");
    let tokens = regional::entity::org_token::Entity::find()
        .all(env.regional.conn())
        .await
        .unwrap();
    assert!(tokens
        .iter()
        .all(|t| t.kind != TokenKind::PasswordReset));
    let outbox = regional::outbox::oldest(env.regional.conn(), 50).await.unwrap();
    assert!(outbox
        .iter()
        .all(|m| m.email_type != vetchium_store::types::EmailKind::OrgPasswordReset));

    // Unknown domain: same generic success.
    env.org
        .request_password_reset("founder@acme.test", "nope.test")
        .await
        .expect("generic response");
}

#[tokio::test]
async fn password_reset_completion_rotates_password_and_kills_sessions() {
    let env = env().await;
    let wire = env.signup_employer("founder@acme.test", PASSWORD).await;

    env.org
        .request_password_reset("founder@acme.test", "acme.test")
        .await
        .unwrap();
    let reset = env.org_token_of_kind(TokenKind::PasswordReset).await;

    let new_password = "EntirelyNewPass99!";
    env.org
        .complete_password_reset(&env.region, &reset, new_password)
        .await
        .expect("complete reset");

    // Old password dead, new password works.
    let err = env
        .org
        .login("founder@acme.test", "acme.test", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));
    env.org
        .login("founder@acme.test", "acme.test", new_password)
        .await
        .expect("login with new password");

    // The pre-reset session is gone.
    let err = load_org_context(&env.global, &env.registry, &env.region, bare(&wire))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));

    // Reset tokens are single-use.
    let err = env
        .org
        .complete_password_reset(&env.region, &reset, "AnotherPass12345!")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));
}

#[tokio::test]
async fn last_superadmin_cannot_be_disabled() {
    let env = env().await;
    let wire = env.signup_employer("founder@acme.test", PASSWORD).await;
    let ctx = load_org_context(&env.global, &env.registry, &env.region, bare(&wire))
        .await
        .unwrap();

    let err = env
        .org
        .disable_user(&ctx, "founder@acme.test")
        .await
        .unwrap_err();
    match err {
        DomainError::InvalidState(msg) => assert_eq!(msg, "Cannot disable last admin user"),
        other => panic!("expected InvalidState, got {other:?}"),
    }

    // Promote a teammate to superadmin, then disabling the founder works.
    env.org.invite_user(&ctx, "teammate@acme.test").await.unwrap();
    let invitation = env.org_token_of_kind(TokenKind::Invitation).await;
    env.org
        .complete_invite(&env.region, &invitation, "Team Mate", PASSWORD, None)
        .await
        .unwrap();
    env.org
        .add_user_role(&ctx, "teammate@acme.test", roles::EMPLOYER_SUPERADMIN)
        .await
        .unwrap();

    env.org
        .disable_user(&ctx, "founder@acme.test")
        .await
        .expect("disable founder");

    // The founder's sessions are gone and the account reads disabled.
    let err = load_org_context(&env.global, &env.registry, &env.region, bare(&wire))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));

    let err = env
        .org
        .login("founder@acme.test", "acme.test", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));
}

#[tokio::test]
async fn role_management_round_trip() {
    let env = env().await;
    let wire = env.signup_employer("founder@acme.test", PASSWORD).await;
    let ctx = load_org_context(&env.global, &env.registry, &env.region, bare(&wire))
        .await
        .unwrap();

    env.org.invite_user(&ctx, "teammate@acme.test").await.unwrap();
    let invitation = env.org_token_of_kind(TokenKind::Invitation).await;
    env.org
        .complete_invite(&env.region, &invitation, "Team Mate", PASSWORD, None)
        .await
        .unwrap();

    env.org
        .add_user_role(&ctx, "teammate@acme.test", roles::EMPLOYER_MANAGE_USERS)
        .await
        .unwrap();
    let err = env
        .org
        .add_user_role(&ctx, "teammate@acme.test", roles::EMPLOYER_MANAGE_USERS)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let err = env
        .org
        .add_user_role(&ctx, "teammate@acme.test", "employer:launch_rockets")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    env.org
        .remove_user_role(&ctx, "teammate@acme.test", roles::EMPLOYER_MANAGE_USERS)
        .await
        .unwrap();
    let err = env
        .org
        .remove_user_role(&ctx, "teammate@acme.test", roles::EMPLOYER_MANAGE_USERS)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound));

    // The founder's own superadmin role is protected while it is the last.
    let err = env
        .org
        .remove_user_role(&ctx, "founder@acme.test", roles::EMPLOYER_SUPERADMIN)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));
}
