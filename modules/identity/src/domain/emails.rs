//! Outbox email composition.
//!
//! Bodies are deliberately plain; the localisation catalogue is an external
//! concern, so only the subject line follows the user's preferred language,
//! with English as the fallback.

use url::Url;
use vetchium_domain_verification::record_host;

pub struct EmailContent {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

fn primary_language(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or("en")
}

pub fn signup_verification(org_ui: &Url, email: &str, domain: &str, token: &str) -> EmailContent {
    let link = format!("{org_ui}signup/complete?token={token}");
    let host = record_host(domain);
    let text_body = format!(
        "Hello {email},\n\n\
         To verify that your organisation owns {domain}, publish a DNS TXT \
         record at {host} with this exact value:\n\n{token}\n\n\
         Then finish signing up at {link}\n"
    );
    let html_body = format!(
        "<p>Hello {email},</p>\
         <p>To verify that your organisation owns <b>{domain}</b>, publish a DNS TXT \
         record at <code>{host}</code> with this exact value:</p>\
         <pre>{token}</pre>\
         <p><a href=\"{link}\">Finish signing up</a></p>"
    );
    EmailContent {
        subject: format!("Verify your domain {domain}"),
        text_body,
        html_body,
    }
}

pub fn tfa_code(code: &str, language: &str) -> EmailContent {
    let subject = match primary_language(language) {
        "de" => "Ihr Anmeldecode".to_owned(),
        _ => "Your sign-in code".to_owned(),
    };
    EmailContent {
        subject,
        text_body: format!("Your sign-in code is {code}. It expires shortly.\n"),
        html_body: format!("<p>Your sign-in code is <b>{code}</b>. It expires shortly.</p>"),
    }
}

pub fn org_invitation(org_ui: &Url, inviter_employer: &str, token_wire: &str) -> EmailContent {
    let link = format!("{org_ui}invitation/complete?token={token_wire}");
    EmailContent {
        subject: format!("You have been invited to join {inviter_employer}"),
        text_body: format!(
            "You have been invited to join {inviter_employer}.\n\
             Set up your account at {link}\n"
        ),
        html_body: format!(
            "<p>You have been invited to join <b>{inviter_employer}</b>.</p>\
             <p><a href=\"{link}\">Set up your account</a></p>"
        ),
    }
}

pub fn password_reset(ui: &Url, token_wire: &str) -> EmailContent {
    let link = format!("{ui}password-reset/complete?token={token_wire}");
    EmailContent {
        subject: "Password reset".to_owned(),
        text_body: format!(
            "A password reset was requested for your account.\n\
             If this was you, reset it at {link}\n\
             Otherwise you can ignore this email.\n"
        ),
        html_body: format!(
            "<p>A password reset was requested for your account.</p>\
             <p>If this was you, <a href=\"{link}\">reset it here</a>. \
             Otherwise you can ignore this email.</p>"
        ),
    }
}

pub fn admin_invitation(admin_ui: &Url, token: &str) -> EmailContent {
    let link = format!("{admin_ui}setup?token={token}");
    EmailContent {
        subject: "You have been invited as a platform administrator".to_owned(),
        text_body: format!("Set up your administrator account at {link}\n"),
        html_body: format!("<p><a href=\"{link}\">Set up your administrator account</a></p>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_email_carries_the_txt_host_and_token() {
        let ui = Url::parse("https://org.vetchium.example/").unwrap();
        let mail = signup_verification(&ui, "founder@acme.test", "acme.test", "deadbeef");
        assert!(mail.text_body.contains("_vetchium-verify.acme.test"));
        assert!(mail.text_body.contains("deadbeef"));
        assert!(mail.html_body.contains("deadbeef"));
    }

    #[test]
    fn tfa_subject_follows_preferred_language() {
        assert_eq!(tfa_code("123456", "de-DE").subject, "Ihr Anmeldecode");
        assert_eq!(tfa_code("123456", "en").subject, "Your sign-in code");
        assert_eq!(tfa_code("123456", "pt-BR").subject, "Your sign-in code");
    }
}
