//! HTML for the term edit forms, built from field specs.

use std::collections::BTreeMap;

use ammonia::clean_text;

use crate::tables::fields::FieldSpec;
use crate::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    Text,
    TextArea,
    /// Typeahead against the base ontology.
    Search,
    Select(Vec<String>),
}

impl InputType {
    /// Parses `text`, `textarea`, `search` or `select(a, b, c)`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s {
            "text" => Some(InputType::Text),
            "textarea" => Some(InputType::TextArea),
            "search" => Some(InputType::Search),
            _ => {
                let options = s.strip_prefix("select(")?.strip_suffix(')')?;
                Some(InputType::Select(
                    options
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect(),
                ))
            }
        }
    }
}

/// Form field name for a template column. The edit mergers map `-` back to
/// spaces.
pub fn field_name(column: &str) -> String {
    column.replace(' ', "-")
}

/// Renders one labeled form row for a field.
pub fn build_form_field(spec: &FieldSpec, value: &str) -> AppResult<String> {
    let input_type =
        InputType::parse(&spec.input_type).ok_or_else(|| AppError::UnknownInputType {
            column: spec.column.clone(),
            input_type: spec.input_type.clone(),
        })?;

    let column = clean_text(&spec.column);
    let name = clean_text(&field_name(&spec.column));
    let value = clean_text(value);
    let required = if spec.required { " required" } else { "" };
    let value_attr = if value.is_empty() {
        String::new()
    } else {
        format!(r#" value="{value}""#)
    };

    let mut html = String::from("<div class=\"row mb-3\">\n");
    html.push_str(&format!(
        "  <label class=\"col-sm-2 col-form-label\">{column}{}</label>\n",
        if spec.required { " *" } else { "" }
    ));
    html.push_str("  <div class=\"col-sm-10\">\n");
    match &input_type {
        InputType::Text => html.push_str(&format!(
            "    <input type=\"text\" class=\"form-control\" name=\"{name}\"{required}{value_attr}>\n"
        )),
        InputType::TextArea => html.push_str(&format!(
            "    <textarea class=\"form-control\" name=\"{name}\" rows=\"3\"{required}>{value}</textarea>\n"
        )),
        InputType::Search => html.push_str(&format!(
            "    <input type=\"text\" class=\"typeahead form-control\" name=\"{name}\" \
             id=\"{name}-typeahead-obi\"{required}{value_attr}>\n"
        )),
        InputType::Select(options) => {
            html.push_str(&format!(
                "    <select class=\"form-select\" name=\"{name}\"{required}>\n"
            ));
            for option in options {
                let option = clean_text(option);
                let selected = if option == value { " selected" } else { "" };
                html.push_str(&format!(
                    "      <option value=\"{option}\"{selected}>{option}</option>\n"
                ));
            }
            html.push_str("    </select>\n");
        }
    }
    if spec.required {
        html.push_str(&format!(
            "    <div class=\"invalid-feedback\">{column} is required</div>\n"
        ));
    }
    if !spec.help.is_empty() {
        html.push_str(&format!(
            "    <div class=\"form-text\">{}</div>\n",
            clean_text(&spec.help)
        ));
    }
    html.push_str("  </div>\n</div>\n");
    Ok(html)
}

/// Renders hidden inputs followed by a row per field, prefilled from
/// `values` by column.
pub fn build_form_html<'a>(
    fields: impl IntoIterator<Item = &'a FieldSpec>,
    values: &BTreeMap<String, String>,
    hidden: &[(&str, &str)],
) -> AppResult<String> {
    let mut html = String::new();
    for (name, value) in hidden {
        html.push_str(&format!(
            "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
            clean_text(name),
            clean_text(value)
        ));
    }
    for spec in fields {
        let value = values.get(&spec.column).map(String::as_str).unwrap_or("");
        html.push_str(&build_form_field(spec, value)?);
    }
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_types() {
        assert_eq!(InputType::parse("text"), Some(InputType::Text));
        assert_eq!(InputType::parse(" textarea "), Some(InputType::TextArea));
        assert_eq!(
            InputType::parse("select(ready, pending)"),
            Some(InputType::Select(vec!["ready".to_string(), "pending".to_string()]))
        );
        assert_eq!(InputType::parse("checkbox"), None);
    }

    #[test]
    fn required_text_field() {
        let html = build_form_field(&FieldSpec::new("label", "text", true), "assay").unwrap();
        assert!(html.contains(r#"<label class="col-sm-2 col-form-label">label *</label>"#));
        assert!(html.contains(r#"name="label" required value="assay""#));
        assert!(html.contains(r#"<div class="invalid-feedback">label is required</div>"#));
    }

    #[test]
    fn search_field_uses_typeahead() {
        let html =
            build_form_field(&FieldSpec::new("parent class", "search", false), "").unwrap();
        assert!(html.contains(r#"class="typeahead form-control""#));
        assert!(html.contains(r#"id="parent-class-typeahead-obi""#));
        assert!(!html.contains("required"));
        assert!(!html.contains("value="));
    }

    #[test]
    fn select_marks_current_value() {
        let html =
            build_form_field(&FieldSpec::new("status", "select(ready, pending)", false), "pending")
                .unwrap();
        assert!(html.contains(r#"<option value="ready">ready</option>"#));
        assert!(html.contains(r#"<option value="pending" selected>pending</option>"#));
    }

    #[test]
    fn values_are_escaped() {
        let html = build_form_field(
            &FieldSpec::new("definition", "textarea", false),
            r#"<script>"x"</script>"#,
        )
        .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn unknown_input_type_names_the_column() {
        let err = build_form_field(&FieldSpec::new("flag", "checkbox", false), "").unwrap_err();
        assert_eq!(err.message(), "Unknown input type 'checkbox' for column 'flag'");
    }

    #[test]
    fn hidden_inputs_come_first() {
        let mut spec = FieldSpec::new("ontology ID", "text", true);
        spec.help = "The term ID".to_string();
        let values = BTreeMap::from([("ontology ID".to_string(), "OBI:1".to_string())]);
        let html = build_form_html([&spec], &values, &[("template", "assays")]).unwrap();
        assert!(html.starts_with(r#"<input type="hidden" name="template" value="assays">"#));
        assert!(html.contains(r#"name="ontology-ID" required value="OBI:1""#));
        assert!(html.contains(r#"<div class="form-text">The&#32;term&#32;ID</div>"#));
    }
}
