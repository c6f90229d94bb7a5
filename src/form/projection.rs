//! Projection of a bound form and its first error into template data

use super::{size_bound, BindingError, Classification, Form, Locale};
use serde_json::{Map, Value};

/// Data handed to the page template (or returned as the 422 body)
pub type TemplateData = Map<String, Value>;

/// Copy every non-ignored field value into `data` under its form key
pub fn assign_form<F: Form>(form: &F, data: &mut TemplateData) {
    for spec in F::fields().iter().filter(|spec| !spec.is_ignored()) {
        data.insert(spec.form_key.to_string(), form.field_value(spec.name));
    }
}

/// Project the first binding error into `data`
///
/// Sets `HasError`, the submitted values, `Err_<Label>` for the offending
/// field and a localized `ErrorMsg`. Only `errors[0]` is reported.
pub fn project_errors<F: Form>(
    errors: &[BindingError],
    data: &mut TemplateData,
    form: &F,
    locale: &dyn Locale,
) {
    let Some(first) = errors.first() else {
        return;
    };

    data.insert("HasError".to_string(), Value::Bool(true));
    assign_form(form, data);

    let Some(field_name) = first.field_names.first() else {
        return;
    };
    let Some(spec) = F::fields()
        .iter()
        .filter(|spec| !spec.is_ignored())
        .find(|spec| spec.name == field_name)
    else {
        return;
    };

    data.insert(format!("Err_{}", spec.label), Value::Bool(true));

    let label = locale.tr(&format!("form.{}", spec.label), &[]);
    let message = match &first.classification {
        Classification::Required => label + &locale.tr("form.require_error", &[]),
        Classification::AlphaDash => label + &locale.tr("form.alpha_dash_error", &[]),
        Classification::AlphaDashDot => label + &locale.tr("form.alpha_dash_dot_error", &[]),
        Classification::MinSize => {
            let bound = size_bound(spec.rules, "MinSize(");
            label + &locale.tr("form.min_size_error", &[&bound])
        }
        Classification::MaxSize => {
            let bound = size_bound(spec.rules, "MaxSize(");
            label + &locale.tr("form.max_size_error", &[&bound])
        }
        Classification::Email => label + &locale.tr("form.email_error", &[]),
        Classification::Url => label + &locale.tr("form.url_error", &[]),
        Classification::Other(name) => format!("{} {}", locale.tr("form.unknown_error", &[]), name),
    };
    data.insert("ErrorMsg".to_string(), Value::String(message));
}
