//! Message catalog for form errors

use std::collections::HashMap;

/// Translates message keys, substituting `%s` placeholders in order
pub trait Locale: Send + Sync {
    fn tr(&self, key: &str, args: &[&str]) -> String;
}

/// In-memory message catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.messages.insert(key.into(), message.into());
    }

    /// English messages for every form and label key in use
    pub fn en_us() -> Self {
        let mut catalog = Self::new();
        for (key, message) in [
            ("form.UserName", "Username"),
            ("form.Email", "Email address"),
            ("form.Password", "Password"),
            ("form.Retype", "Re-type password"),
            ("form.TokenName", "Token name"),
            ("form.require_error", " cannot be empty."),
            (
                "form.alpha_dash_error",
                " must be valid alpha or numeric or dash(-_) characters.",
            ),
            (
                "form.alpha_dash_dot_error",
                " must be valid alpha or numeric or dash(-_) or dot characters.",
            ),
            ("form.min_size_error", " must contain at least %s characters."),
            ("form.max_size_error", " must contain at most %s characters."),
            ("form.email_error", " is not a valid email address."),
            ("form.url_error", " is not a valid URL."),
            ("form.unknown_error", "Unknown error:"),
            ("form.password_not_match", "Password and re-type password are not same."),
            ("form.username_been_taken", "Username or email has already been taken."),
        ] {
            catalog.insert(key, message);
        }
        catalog
    }
}

impl Locale for Catalog {
    fn tr(&self, key: &str, args: &[&str]) -> String {
        let Some(template) = self.messages.get(key) else {
            return key.to_string();
        };

        let mut out = String::with_capacity(template.len());
        let mut args = args.iter();
        let mut rest = template.as_str();
        while let Some(pos) = rest.find("%s") {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => out.push_str(arg),
                None => out.push_str("%s"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}
