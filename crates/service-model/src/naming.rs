//! Operation name transforms matching the AWS SDK method names

use regex::Regex;
use std::sync::LazyLock;

static FIRST_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid first-cap pattern"));
static END_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid end-cap pattern"));
static PLURAL_ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{2,}s$").expect("valid plural acronym pattern"));

/// Convert an operation name to its snake_case method name
///
/// `CreateTopic` -> `create_topic`, `ListSMSSandboxPhoneNumbers` ->
/// `list_sms_sandbox_phone_numbers`, `ListARNs` -> `list_arns`.
/// Names that already contain an underscore are returned unchanged.
pub fn xform_name(name: &str) -> String {
    if name.contains('_') {
        return name.to_string();
    }

    // Trailing plural acronyms ("ARNs") would otherwise split as "ar_ns"
    let name = match PLURAL_ACRONYM.find(name) {
        Some(m) => format!("{}_{}", &name[..m.start()], m.as_str().to_lowercase()),
        None => name.to_string(),
    };

    let s1 = FIRST_CAP.replace_all(&name, "${1}_${2}");
    END_CAP.replace_all(&s1, "${1}_${2}").to_lowercase()
}
