//! Form validation
//!
//! Each form is checked field by field; the first failing field is reported.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::{
    error::{SocialError, SocialResult},
    models::Upload,
};

pub const USERNAME_MAX_LEN: usize = 25;
pub const POST_TEXT_MAX_LEN: usize = 500;
pub const FULL_NAME_MAX_LEN: usize = 50;
pub const BIO_MAX_LEN: usize = 300;

/// Validate username
pub fn validate_username(username: &str) -> SocialResult<()> {
    if username.is_empty() {
        return Err(SocialError::validation("username", "Username is required"));
    }

    if username.chars().count() < 3 {
        return Err(SocialError::validation(
            "username",
            "Username must be at least 3 characters long",
        ));
    }

    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(SocialError::validation(
            "username",
            format!("Username must be at most {} characters long", USERNAME_MAX_LEN),
        ));
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.@+-]+$").expect("Failed to compile username regex")
    });

    if !regex.is_match(username) {
        return Err(SocialError::validation(
            "username",
            "Username can only contain letters, numbers, and @/./+/-/_ characters",
        ));
    }

    Ok(())
}

/// Validate an email address and return it with its domain lower-cased
pub fn normalize_email(email: &str) -> SocialResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(SocialError::validation("email", "Email is required"));
    }

    if email.len() > 254 {
        return Err(SocialError::validation(
            "email",
            "Email must be at most 254 characters long",
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(SocialError::validation("email", "Invalid email format"));
    }

    let (local, domain) = email
        .rsplit_once('@')
        .ok_or_else(|| SocialError::validation("email", "Invalid email format"))?;

    Ok(format!("{}@{}", local, domain.to_lowercase()))
}

/// Validate password
pub fn validate_password(password: &str) -> SocialResult<()> {
    if password.is_empty() {
        return Err(SocialError::validation("password1", "Password is required"));
    }

    if password.chars().count() < 8 {
        return Err(SocialError::validation(
            "password1",
            "Password must be at least 8 characters long",
        ));
    }

    if password.chars().count() > 128 {
        return Err(SocialError::validation(
            "password1",
            "Password must be at most 128 characters long",
        ));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(SocialError::validation(
            "password1",
            "Password can't be entirely numeric",
        ));
    }

    Ok(())
}

/// Validate a new password and its confirmation
pub fn validate_password_pair(password1: &str, password2: &str) -> SocialResult<()> {
    validate_password(password1)?;

    if password1 != password2 {
        return Err(SocialError::validation(
            "password2",
            "The two password fields didn't match",
        ));
    }

    Ok(())
}

/// Account registration form
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> SocialResult<()> {
        validate_username(&self.username)?;
        normalize_email(&self.email)?;
        validate_password_pair(&self.password1, &self.password2)
    }
}

/// Post creation form
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: String,
    pub photos: Vec<Upload>,
}

impl PostForm {
    /// Trim the text, drop empty file parts and check the limits
    pub fn clean(self, max_photos: usize) -> SocialResult<PostForm> {
        let text = self.text.trim().to_string();
        if text.chars().count() > POST_TEXT_MAX_LEN {
            return Err(SocialError::validation(
                "text",
                format!("Text must be at most {} characters long", POST_TEXT_MAX_LEN),
            ));
        }

        let photos: Vec<Upload> = self
            .photos
            .into_iter()
            .filter(|upload| !upload.is_empty())
            .collect();
        if photos.len() > max_photos {
            return Err(SocialError::validation(
                "photos",
                format!("At most {} photos can be attached to a post", max_photos),
            ));
        }

        Ok(PostForm { text, photos })
    }
}

/// Profile update form
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<Upload>,
}

impl ProfileForm {
    pub fn clean(self) -> SocialResult<ProfileForm> {
        let full_name = self.full_name.map(|name| name.trim().to_string());
        if let Some(name) = &full_name {
            if name.chars().count() > FULL_NAME_MAX_LEN {
                return Err(SocialError::validation(
                    "full_name",
                    format!("Full name must be at most {} characters long", FULL_NAME_MAX_LEN),
                ));
            }
        }

        let bio = self.bio.map(|bio| bio.trim().to_string());
        if let Some(bio) = &bio {
            if bio.chars().count() > BIO_MAX_LEN {
                return Err(SocialError::validation(
                    "bio",
                    format!("Bio must be at most {} characters long", BIO_MAX_LEN),
                ));
            }
        }

        Ok(ProfileForm {
            full_name,
            bio,
            avatar: self.avatar.filter(|upload| !upload.is_empty()),
        })
    }
}
