//! Regional-schema entities. The schema is structurally identical in every
//! region; each employer's rows live only in its home region.

pub mod email_outbox;
pub mod employer_domain;
pub mod org_session;
pub mod org_token;
pub mod org_user;
pub mod org_user_role;
