//! Tool descriptions synthesized from model documentation

use regex::Regex;
use service_model::{OperationModel, Shape};
use std::sync::LazyLock;

use crate::params::DEFAULT_REGION;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));
static SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid space pattern"));

/// Reduce model documentation to plain text
pub fn strip_html(documentation: &str) -> String {
    let text = TAG.replace_all(documentation, " ");
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&");
    SPACE.replace_all(text.trim(), " ").into_owned()
}

/// Description for a generated tool
///
/// The operation summary, then (unless `skip_params`) an `Args:` listing
/// with each parameter's type and whether it is required, then the
/// top-level result fields.
pub fn tool_description(service_display: &str, operation: &OperationModel, skip_params: bool) -> String {
    let summary = operation
        .documentation
        .as_deref()
        .map(strip_html)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("Execute the {} {} operation.", service_display, operation.name));

    let mut description = summary;

    if !skip_params {
        description.push_str("\n\nArgs:");
        for member in &operation.input {
            description.push_str(&format!(
                "\n    {} ({}, {})",
                member.name,
                type_label(&member.shape),
                if member.required { "required" } else { "optional" }
            ));
            if let Some(doc) = member.documentation.as_deref().map(strip_html) {
                if !doc.is_empty() {
                    description.push_str(": ");
                    description.push_str(&doc);
                }
            }
        }
        description.push_str(&format!(
            "\n    region (string, optional): AWS region, defaults to {}",
            DEFAULT_REGION
        ));
    }

    let outputs = operation.output_members();
    description.push_str("\n\nReturns:\n    ");
    if outputs.is_empty() {
        description.push_str("ResponseMetadata only");
    } else {
        let fields: Vec<String> = outputs
            .iter()
            .map(|m| format!("{} ({})", m.name, type_label(&m.shape)))
            .collect();
        description.push_str(&fields.join(", "));
    }

    description
}

fn type_label(shape: &Shape) -> String {
    match shape {
        Shape::List { member, .. } => format!("list of {}", type_label(member)),
        Shape::Map { value, .. } => format!("map of string to {}", type_label(value)),
        other => other.type_name().to_string(),
    }
}
