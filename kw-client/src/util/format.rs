use std::collections::BTreeMap;

use kw_shared::api::ServiceSummary;
use kw_shared::status::ServiceStatus;

const WIDTH_NAME: usize = 24;
const WIDTH_ACCOUNT: usize = 16;

pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

pub fn services_table(services: &[ServiceSummary]) -> String {
    if services.is_empty() {
        return "No services configured".to_string();
    }
    let mut out = format!("{:<WIDTH_NAME$} {}\n", "NAME", "ACCOUNT");
    for svc in services {
        out.push_str(&format!(
            "{:<WIDTH_NAME$} {}\n",
            truncate_str(&svc.name, WIDTH_NAME - 1),
            truncate_str(&svc.account, WIDTH_ACCOUNT),
        ));
    }
    out
}

pub fn status_table(statuses: &BTreeMap<String, ServiceStatus>) -> String {
    if statuses.is_empty() {
        return "No services configured".to_string();
    }
    let mut out = format!("{:<WIDTH_NAME$} {}\n", "NAME", "STATUS");
    for (name, status) in statuses {
        out.push_str(&format!(
            "{:<WIDTH_NAME$} {}\n",
            truncate_str(name, WIDTH_NAME - 1),
            status
        ));
    }
    out
}
