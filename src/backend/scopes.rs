//! Datadog application key scopes a role may grant.

pub const APP_KEY_SCOPES: &[&str] = &[
    "user_access_invite",
    "user_access_manage",
    "user_access_read",
    "usage_read",
    "incident_read",
    "incident_settings_write",
    "incident_write",
    "security_monitoring_filters_read",
    "security_monitoring_filters_write",
    "security_monitoring_rules_read",
    "security_monitoring_rules_write",
    "security_monitoring_signals_read",
    "dashboards_public_share",
    "dashboards_read",
    "dashboards_write",
    "events_read",
    "metrics_read",
    "timeseries_query",
    "monitors_downtime",
    "monitors_read",
    "monitors_write",
    "synthetics_global_variable_read",
    "synthetics_global_variable_write",
    "synthetics_private_location_read",
    "synthetics_private_location_write",
    "synthetics_read",
    "synthetics_write",
];

pub fn is_valid_scope(scope: &str) -> bool {
    APP_KEY_SCOPES.contains(&scope)
}

/// First scope not in [`APP_KEY_SCOPES`], if any
pub fn find_invalid_scope<S: AsRef<str>>(scopes: &[S]) -> Option<&str> {
    scopes.iter().map(AsRef::as_ref).find(|scope| !is_valid_scope(scope))
}
