//! Form binding, validation and template projection
//!
//! Each form type describes its fields with a static `FieldSpec` table. The
//! rule declaration string (`Required;AlphaDashDot;MaxSize(35)`) drives
//! validation, and the same table drives projection of the submitted values
//! and the first error back into template data.

pub mod locale;
pub mod projection;
pub mod user;

pub use locale::{Catalog, Locale};
pub use projection::{assign_form, project_errors, TemplateData};
pub use user::{NewAccessTokenForm, RegisterForm, SignInForm};

use serde_json::Value;
use std::fmt;

lazy_static::lazy_static! {
    static ref ALPHA_DASH_PATTERN: regex::Regex =
        regex::Regex::new(r"[^0-9A-Za-z_\-]").unwrap();
    static ref ALPHA_DASH_DOT_PATTERN: regex::Regex =
        regex::Regex::new(r"[^0-9A-Za-z_\-.]").unwrap();
    static ref EMAIL_PATTERN: regex::Regex =
        regex::Regex::new(r"^[\w.%+\-]+@[\w\-]+(?:\.[\w\-]+)*\.[A-Za-z]{2,}$").unwrap();
    static ref URL_PATTERN: regex::Regex =
        regex::Regex::new(r"^(?:https?|ftp)://[^\s/$.?#][^\s]*$").unwrap();
}

/// Form key marking a field that is never copied into template data
pub const IGNORED_FORM_KEY: &str = "-";

/// Static description of one form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field identifier, as named by binding errors
    pub name: &'static str,
    /// Display label, used for `Err_<Label>` and the `form.<Label>` message
    pub label: &'static str,
    /// Key of the submitted value and of the template data entry
    pub form_key: &'static str,
    /// Rule declaration, `;`-separated
    pub rules: &'static str,
}

impl FieldSpec {
    pub fn is_ignored(&self) -> bool {
        self.form_key == IGNORED_FORM_KEY
    }
}

/// A bound form whose fields are described by a static table
pub trait Form {
    fn fields() -> &'static [FieldSpec];

    /// Current value of the field called `name`, `Value::Null` if unknown
    fn field_value(&self, name: &str) -> Value;
}

/// A single parsed validation rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    AlphaDash,
    AlphaDashDot,
    MinSize(usize),
    MaxSize(usize),
    Email,
    Url,
}

impl Rule {
    fn parse(decl: &str) -> Option<Rule> {
        match decl {
            "Required" => Some(Rule::Required),
            "AlphaDash" => Some(Rule::AlphaDash),
            "AlphaDashDot" => Some(Rule::AlphaDashDot),
            "Email" => Some(Rule::Email),
            "Url" => Some(Rule::Url),
            _ => {
                if let Some(n) = size_argument(decl, "MinSize(") {
                    Some(Rule::MinSize(n))
                } else {
                    size_argument(decl, "MaxSize(").map(Rule::MaxSize)
                }
            }
        }
    }

    fn classification(&self) -> Classification {
        match self {
            Rule::Required => Classification::Required,
            Rule::AlphaDash => Classification::AlphaDash,
            Rule::AlphaDashDot => Classification::AlphaDashDot,
            Rule::MinSize(_) => Classification::MinSize,
            Rule::MaxSize(_) => Classification::MaxSize,
            Rule::Email => Classification::Email,
            Rule::Url => Classification::Url,
        }
    }

    /// Whether `value` satisfies the rule. Rules other than `Required`
    /// accept an empty value.
    fn check(&self, value: &str) -> bool {
        match self {
            Rule::Required => !value.trim().is_empty(),
            _ if value.is_empty() => true,
            Rule::AlphaDash => !ALPHA_DASH_PATTERN.is_match(value),
            Rule::AlphaDashDot => !ALPHA_DASH_DOT_PATTERN.is_match(value),
            Rule::MinSize(n) => value.chars().count() >= *n,
            Rule::MaxSize(n) => value.chars().count() <= *n,
            Rule::Email => EMAIL_PATTERN.is_match(value),
            Rule::Url => URL_PATTERN.is_match(value),
        }
    }
}

fn size_argument(decl: &str, prefix: &str) -> Option<usize> {
    decl.strip_prefix(prefix)?
        .strip_suffix(')')?
        .trim()
        .parse()
        .ok()
}

/// Parse a rule declaration, skipping rules this binder does not know
pub fn parse_rules(decl: &str) -> Vec<Rule> {
    decl.split(';')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .filter_map(|d| {
            let rule = Rule::parse(d);
            if rule.is_none() {
                tracing::debug!("Unknown form rule {:?}", d);
            }
            rule
        })
        .collect()
}

/// Bound text of the first rule in `decl` starting with `prefix`
///
/// `size_bound("Required;MinSize(6)", "MinSize(")` is `"6"`; an empty string
/// when no such rule is declared.
pub fn size_bound(decl: &str, prefix: &str) -> String {
    decl.split(';')
        .find_map(|rule| {
            rule.strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(')'))
        })
        .unwrap_or_default()
        .to_string()
}

/// Kind of validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Required,
    AlphaDash,
    AlphaDashDot,
    MinSize,
    MaxSize,
    Email,
    Url,
    /// Any failure the projection has no dedicated message for
    Other(String),
}

impl Classification {
    pub fn as_str(&self) -> &str {
        match self {
            Classification::Required => "RequiredError",
            Classification::AlphaDash => "AlphaDashError",
            Classification::AlphaDashDot => "AlphaDashDotError",
            Classification::MinSize => "MinSizeError",
            Classification::MaxSize => "MaxSizeError",
            Classification::Email => "EmailError",
            Classification::Url => "UrlError",
            Classification::Other(name) => name,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed validation, naming the offending field(s)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingError {
    pub field_names: Vec<String>,
    pub classification: Classification,
}

impl BindingError {
    pub fn new(field: &str, classification: Classification) -> Self {
        Self {
            field_names: vec![field.to_string()],
            classification,
        }
    }
}

/// Text form of a field value as the rules see it
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(false) => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Validate `form` against its field table
///
/// Fields are checked in table order; each field reports at most its first
/// failing rule.
pub fn validate_form<F: Form>(form: &F) -> Vec<BindingError> {
    F::fields()
        .iter()
        .filter_map(|spec| {
            let text = value_text(&form.field_value(spec.name));
            parse_rules(spec.rules)
                .into_iter()
                .find(|rule| !rule.check(&text))
                .map(|rule| BindingError::new(spec.name, rule.classification()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    struct ProfileForm {
        name: String,
        site: String,
        age: i64,
    }

    static PROFILE_FIELDS: [FieldSpec; 3] = [
        FieldSpec {
            name: "name",
            label: "UserName",
            form_key: "uname",
            rules: "Required;AlphaDash;MinSize(3);MaxSize(8)",
        },
        FieldSpec {
            name: "site",
            label: "Website",
            form_key: "site",
            rules: "Url",
        },
        FieldSpec {
            name: "age",
            label: "Age",
            form_key: "-",
            rules: "",
        },
    ];

    impl Form for ProfileForm {
        fn fields() -> &'static [FieldSpec] {
            &PROFILE_FIELDS
        }

        fn field_value(&self, name: &str) -> Value {
            match name {
                "name" => json!(self.name),
                "site" => json!(self.site),
                "age" => json!(self.age),
                _ => Value::Null,
            }
        }
    }

    fn profile(name: &str, site: &str) -> ProfileForm {
        ProfileForm {
            name: name.to_string(),
            site: site.to_string(),
            age: 30,
        }
    }

    #[test]
    fn test_parse_rules() {
        assert_eq!(
            parse_rules("Required;AlphaDashDot;MaxSize(35)"),
            vec![Rule::Required, Rule::AlphaDashDot, Rule::MaxSize(35)]
        );
        assert_eq!(parse_rules("MinSize(6); Email"), vec![Rule::MinSize(6), Rule::Email]);
        assert_eq!(parse_rules("Range(1,2);MaxSize(x)"), vec![]);
        assert_eq!(parse_rules(""), vec![]);
    }

    #[rstest]
    #[case("Required;MinSize(6)", "MinSize(", "6")]
    #[case("Required;MaxSize(255)", "MaxSize(", "255")]
    #[case("MinSize(2);MaxSize(10)", "MaxSize(", "10")]
    #[case("Required", "MinSize(", "")]
    fn test_size_bound(#[case] decl: &str, #[case] prefix: &str, #[case] expected: &str) {
        assert_eq!(size_bound(decl, prefix), expected);
    }

    #[rstest]
    #[case(Rule::Required, "  ", false)]
    #[case(Rule::Required, "x", true)]
    #[case(Rule::AlphaDash, "user_name-1", true)]
    #[case(Rule::AlphaDash, "user.name", false)]
    #[case(Rule::AlphaDashDot, "user.name", true)]
    #[case(Rule::AlphaDashDot, "user name", false)]
    #[case(Rule::AlphaDashDot, "üser", false)]
    #[case(Rule::MinSize(3), "日本語", true)]
    #[case(Rule::MinSize(3), "ab", false)]
    #[case(Rule::MaxSize(2), "日本", true)]
    #[case(Rule::MaxSize(2), "abc", false)]
    #[case(Rule::Email, "alice@example.com", true)]
    #[case(Rule::Email, "alice@", false)]
    #[case(Rule::Url, "https://example.com/a?b=c", true)]
    #[case(Rule::Url, "example.com", false)]
    #[case(Rule::Email, "", true)]
    fn test_rule_check(#[case] rule: Rule, #[case] value: &str, #[case] ok: bool) {
        assert_eq!(rule.check(value), ok);
    }

    #[test]
    fn test_validate_form_valid() {
        assert_eq!(validate_form(&profile("alice", "")), vec![]);
    }

    #[test]
    fn test_validate_form_first_failing_rule_per_field() {
        let errors = validate_form(&profile("a.b", "not a url"));
        assert_eq!(
            errors,
            vec![
                BindingError::new("name", Classification::AlphaDash),
                BindingError::new("site", Classification::Url),
            ]
        );
    }

    #[test]
    fn test_validate_form_required_before_size() {
        let errors = validate_form(&profile("", ""));
        assert_eq!(errors, vec![BindingError::new("name", Classification::Required)]);
    }

    #[test]
    fn test_classification_names() {
        assert_eq!(Classification::Required.as_str(), "RequiredError");
        assert_eq!(Classification::MaxSize.to_string(), "MaxSizeError");
        assert_eq!(
            Classification::Other("TypeError".to_string()).as_str(),
            "TypeError"
        );
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&Value::Null), "");
        assert_eq!(value_text(&json!(false)), "");
        assert_eq!(value_text(&json!(true)), "true");
        assert_eq!(value_text(&json!(12)), "12");
    }
}
