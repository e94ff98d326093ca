//! Account mail rendering

use common::mail::{MailKind, OutgoingMail};
use social::models::Identity;

use crate::config::AuthConfig;

/// Mail carrying the account activation link
pub fn activation_mail(config: &AuthConfig, identity: &Identity, token: &str) -> OutgoingMail {
    let link = format!("{}/auth/activate/{}", config.base_url(), token);
    let body = format!(
        "Hi {},\n\nPlease confirm your registration by opening the link below:\n\n{}\n\nThe link is valid for 7 days.\n",
        identity.username, link
    );

    OutgoingMail::new(
        MailKind::Activation,
        &identity.email,
        &config.from_email,
        "Activate your account",
        body,
    )
}

/// Mail carrying the password reset link
pub fn password_reset_mail(config: &AuthConfig, identity: &Identity, token: &str) -> OutgoingMail {
    let link = format!(
        "{}/auth/password-reset/confirm?token={}",
        config.base_url(),
        token
    );
    let body = format!(
        "Hi {},\n\nSomeone asked to reset the password of your account. \
         Open the link below to choose a new one:\n\n{}\n\n\
         If it was not you, ignore this mail. The link is valid for 3 days.\n",
        identity.username, link
    );

    OutgoingMail::new(
        MailKind::PasswordReset,
        &identity.email,
        &config.from_email,
        "Reset your password",
        body,
    )
}
