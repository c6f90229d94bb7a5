//! Forms submitted by the user pages

use super::{FieldSpec, Form};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInForm {
    #[serde(rename = "uname", default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub remember: bool,
}

static SIGN_IN_FIELDS: [FieldSpec; 3] = [
    FieldSpec {
        name: "user_name",
        label: "UserName",
        form_key: "uname",
        rules: "Required;MaxSize(35)",
    },
    FieldSpec {
        name: "password",
        label: "Password",
        form_key: "password",
        rules: "Required;MaxSize(255)",
    },
    FieldSpec {
        name: "remember",
        label: "Remember",
        form_key: "remember",
        rules: "",
    },
];

impl Form for SignInForm {
    fn fields() -> &'static [FieldSpec] {
        &SIGN_IN_FIELDS
    }

    fn field_value(&self, name: &str) -> Value {
        match name {
            "user_name" => json!(self.user_name),
            "password" => json!(self.password),
            "remember" => json!(self.remember),
            _ => Value::Null,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(rename = "uname", default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub retype: String,
}

static REGISTER_FIELDS: [FieldSpec; 4] = [
    FieldSpec {
        name: "user_name",
        label: "UserName",
        form_key: "uname",
        rules: "Required;AlphaDashDot;MaxSize(35)",
    },
    FieldSpec {
        name: "email",
        label: "Email",
        form_key: "email",
        rules: "Required;Email;MaxSize(50)",
    },
    FieldSpec {
        name: "password",
        label: "Password",
        form_key: "password",
        rules: "Required;MinSize(6);MaxSize(255)",
    },
    FieldSpec {
        name: "retype",
        label: "Retype",
        form_key: "retype",
        rules: "",
    },
];

impl Form for RegisterForm {
    fn fields() -> &'static [FieldSpec] {
        &REGISTER_FIELDS
    }

    fn field_value(&self, name: &str) -> Value {
        match name {
            "user_name" => json!(self.user_name),
            "email" => json!(self.email),
            "password" => json!(self.password),
            "retype" => json!(self.retype),
            _ => Value::Null,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAccessTokenForm {
    #[serde(default)]
    pub name: String,
    /// Owner of the token, set from the signed-in user
    #[serde(skip)]
    pub uid: i64,
}

static NEW_ACCESS_TOKEN_FIELDS: [FieldSpec; 2] = [
    FieldSpec {
        name: "name",
        label: "TokenName",
        form_key: "name",
        rules: "Required;MaxSize(255)",
    },
    FieldSpec {
        name: "uid",
        label: "Uid",
        form_key: "-",
        rules: "",
    },
];

impl Form for NewAccessTokenForm {
    fn fields() -> &'static [FieldSpec] {
        &NEW_ACCESS_TOKEN_FIELDS
    }

    fn field_value(&self, name: &str) -> Value {
        match name {
            "name" => json!(self.name),
            "uid" => json!(self.uid),
            _ => Value::Null,
        }
    }
}

/// HTML checkboxes submit `on` when ticked and nothing otherwise
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(matches!(raw.as_str(), "on" | "true" | "1"))
}
