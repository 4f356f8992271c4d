//! Built-in object tables.
//!
//! Each function returns the schema of one AWX object type. Engines are
//! built from these tables; nothing here talks to the network.

use crate::association::Association;
use crate::hooks::{preserve_encrypted_json, preserve_write_only, require_prior_state};
use crate::resolve::LookupGroup;
use crate::schema::{AttributeKind as Kind, AttributeSpec as Attr, ResourceSchema};

/// Host membership in inventory groups.
pub const HOST_GROUP: Association = Association::new("host_group", "/api/v2/hosts/{id}/groups/");

/// Role grants to a team.
pub const TEAM_ROLE: Association = Association::new("team_role", "/api/v2/teams/{id}/roles/");

/// Role grants to a user.
pub const USER_ROLE: Association = Association::new("user_role", "/api/v2/users/{id}/roles/");

/// Credentials attached to a job template.
pub const JOB_TEMPLATE_CREDENTIAL: Association =
    Association::new("job_template_credential", "/api/v2/job_templates/{id}/credentials/");

const NAMES: [&str; 9] = [
    "organization",
    "inventory",
    "host",
    "credential",
    "user",
    "team",
    "label",
    "job_template",
    "settings_misc_system",
];

fn id() -> Attr {
    Attr::new("id", Kind::Int64).read_only()
}

fn optional(name: &'static str, kind: Kind) -> Attr {
    Attr::new(name, kind).omit_if_empty()
}

fn by_id_or_name(schema: ResourceSchema) -> ResourceSchema {
    schema
        .lookup(LookupGroup::by_id())
        .lookup(LookupGroup::by_name())
        .exactly_one_of(&["id", "name"])
}

/// `/api/v2/organizations/`
#[must_use]
pub fn organization() -> ResourceSchema {
    let schema = ResourceSchema::new("Organization", "/api/v2/organizations/")
        .attribute(id())
        .attribute(Attr::new("name", Kind::String).required())
        .attribute(optional("description", Kind::String))
        .attribute(optional("max_hosts", Kind::Int64))
        .attribute(optional("default_environment", Kind::Int64))
        .hook(require_prior_state);
    by_id_or_name(schema)
}

/// `/api/v2/inventories/`
#[must_use]
pub fn inventory() -> ResourceSchema {
    let schema = ResourceSchema::new("Inventory", "/api/v2/inventories/")
        .attribute(id())
        .attribute(Attr::new("name", Kind::String).required())
        .attribute(Attr::new("organization", Kind::Int64).required())
        .attribute(optional("description", Kind::String))
        .attribute(optional("kind", Kind::String))
        .attribute(optional("host_filter", Kind::String))
        .attribute(optional("variables", Kind::JsonYamlText))
        .attribute(optional("prevent_instance_group_fallback", Kind::Bool))
        .attribute(Attr::new("total_hosts", Kind::Int64).read_only())
        .attribute(Attr::new("has_active_failures", Kind::Bool).read_only())
        .attribute(Attr::new("pending_deletion", Kind::Bool).read_only())
        .hook(require_prior_state);
    by_id_or_name(schema)
}

/// `/api/v2/hosts/`
#[must_use]
pub fn host() -> ResourceSchema {
    let schema = ResourceSchema::new("Host", "/api/v2/hosts/")
        .attribute(id())
        .attribute(Attr::new("name", Kind::String).required())
        .attribute(Attr::new("inventory", Kind::Int64).required())
        .attribute(optional("description", Kind::String))
        .attribute(optional("enabled", Kind::Bool))
        .attribute(optional("instance_id", Kind::String))
        .attribute(optional("variables", Kind::JsonYamlText))
        .attribute(Attr::new("last_job", Kind::Int64).read_only())
        .hook(require_prior_state);
    by_id_or_name(schema)
}

/// `/api/v2/credentials/`
///
/// Secret inputs come back as `$encrypted$` and are restored from prior
/// state.
#[must_use]
pub fn credential() -> ResourceSchema {
    let schema = ResourceSchema::new("Credential", "/api/v2/credentials/")
        .attribute(id())
        .attribute(Attr::new("name", Kind::String).required())
        .attribute(Attr::new("credential_type", Kind::Int64).required())
        .attribute(optional("organization", Kind::Int64))
        .attribute(optional("description", Kind::String))
        .attribute(optional("inputs", Kind::JsonText))
        .attribute(Attr::new("kind", Kind::String).read_only())
        .attribute(Attr::new("cloud", Kind::Bool).read_only())
        .attribute(Attr::new("kubernetes", Kind::Bool).read_only())
        .attribute(Attr::new("managed", Kind::Bool).read_only())
        .hook(require_prior_state)
        .hook(preserve_encrypted_json);
    by_id_or_name(schema)
}

/// `/api/v2/users/`
#[must_use]
pub fn user() -> ResourceSchema {
    ResourceSchema::new("User", "/api/v2/users/")
        .attribute(id())
        .attribute(Attr::new("username", Kind::String).required())
        .attribute(Attr::new("password", Kind::String).sensitive().omit_if_empty())
        .attribute(optional("first_name", Kind::String))
        .attribute(optional("last_name", Kind::String))
        .attribute(optional("email", Kind::String))
        .attribute(optional("is_superuser", Kind::Bool))
        .attribute(optional("is_system_auditor", Kind::Bool))
        .attribute(Attr::new("ldap_dn", Kind::String).read_only())
        .attribute(Attr::new("last_login", Kind::String).read_only())
        .attribute(Attr::new("external_account", Kind::String).read_only())
        .lookup(LookupGroup::by_id())
        .lookup(LookupGroup::by_username())
        .exactly_one_of(&["id", "username"])
        .hook(require_prior_state)
        .hook(preserve_write_only)
}

/// `/api/v2/teams/`
#[must_use]
pub fn team() -> ResourceSchema {
    let schema = ResourceSchema::new("Team", "/api/v2/teams/")
        .attribute(id())
        .attribute(Attr::new("name", Kind::String).required())
        .attribute(Attr::new("organization", Kind::Int64).required())
        .attribute(optional("description", Kind::String))
        .hook(require_prior_state);
    by_id_or_name(schema)
}

/// `/api/v2/labels/`
///
/// Label names are only unique within an organization.
#[must_use]
pub fn label() -> ResourceSchema {
    ResourceSchema::new("Label", "/api/v2/labels/")
        .attribute(id())
        .attribute(Attr::new("name", Kind::String).required())
        .attribute(Attr::new("organization", Kind::Int64).required())
        .lookup(LookupGroup::by_id())
        .lookup(LookupGroup::by_name_scoped("by_name_organization", "organization"))
        .exactly_one_of(&["id", "name"])
        .hook(require_prior_state)
}

/// `/api/v2/job_templates/`
#[must_use]
pub fn job_template() -> ResourceSchema {
    let mut schema = ResourceSchema::new("JobTemplate", "/api/v2/job_templates/")
        .attribute(id())
        .attribute(Attr::new("name", Kind::String).required())
        .attribute(Attr::new("inventory", Kind::Int64))
        .attribute(Attr::new("project", Kind::Int64).required())
        .attribute(Attr::new("playbook", Kind::String).required())
        .attribute(optional("description", Kind::String))
        .attribute(optional("job_type", Kind::String))
        .attribute(optional("organization", Kind::Int64))
        .attribute(optional("execution_environment", Kind::Int64))
        .attribute(optional("extra_vars", Kind::JsonYamlText))
        .attribute(optional("forks", Kind::Int64))
        .attribute(optional("limit", Kind::String))
        .attribute(optional("verbosity", Kind::String))
        .attribute(optional("job_tags", Kind::String))
        .attribute(optional("skip_tags", Kind::String))
        .attribute(optional("scm_branch", Kind::String))
        .attribute(optional("timeout", Kind::Int64))
        .attribute(optional("job_slice_count", Kind::Int64))
        .attribute(optional("host_config_key", Kind::String))
        .attribute(optional("webhook_service", Kind::String))
        .attribute(optional("webhook_credential", Kind::Int64));

    for flag in [
        "allow_simultaneous",
        "ask_credential_on_launch",
        "ask_inventory_on_launch",
        "ask_limit_on_launch",
        "ask_variables_on_launch",
        "become_enabled",
        "diff_mode",
        "force_handlers",
        "survey_enabled",
        "use_fact_cache",
    ] {
        schema = schema.attribute(optional(flag, Kind::Bool));
    }

    by_id_or_name(schema.hook(require_prior_state))
}

/// `/api/v2/settings/system/`
#[must_use]
pub fn settings_misc_system() -> ResourceSchema {
    let mut schema = ResourceSchema::new("SettingsMiscSystem", "/api/v2/settings/system/").singleton();

    for (name, kind) in [
        ("ACTIVITY_STREAM_ENABLED", Kind::Bool),
        ("ACTIVITY_STREAM_ENABLED_FOR_INVENTORY_SYNC", Kind::Bool),
        ("AUTOMATION_ANALYTICS_GATHER_INTERVAL", Kind::Int64),
        ("AUTOMATION_ANALYTICS_URL", Kind::String),
        ("CSRF_TRUSTED_ORIGINS", Kind::ListString),
        ("CUSTOM_VENV_PATHS", Kind::ListString),
        ("DEFAULT_EXECUTION_ENVIRONMENT", Kind::Int64),
        ("MANAGE_ORGANIZATION_AUTH", Kind::Bool),
        ("ORG_ADMINS_CAN_SEE_ALL_USERS", Kind::Bool),
        ("PROXY_IP_ALLOWED_LIST", Kind::ListString),
        ("REDHAT_USERNAME", Kind::String),
        ("REMOTE_HOST_HEADERS", Kind::ListString),
        ("SUBSCRIPTIONS_USERNAME", Kind::String),
        ("TOWER_URL_BASE", Kind::String),
        ("UI_NEXT", Kind::Bool),
    ] {
        schema = schema.attribute(optional(name, kind));
    }

    schema
        .attribute(optional("REDHAT_PASSWORD", Kind::String).sensitive())
        .attribute(optional("SUBSCRIPTIONS_PASSWORD", Kind::String).sensitive())
        .attribute(Attr::new("INSTALL_UUID", Kind::String).read_only())
        .attribute(Attr::new("IS_K8S", Kind::Bool).read_only())
        .attribute(Attr::new("LICENSE", Kind::JsonText).read_only())
        .hook(preserve_write_only)
}

/// Names accepted by [`lookup`].
#[must_use]
pub const fn names() -> &'static [&'static str] {
    &NAMES
}

/// Schema for an object type by its snake case name.
#[must_use]
pub fn lookup(name: &str) -> Option<ResourceSchema> {
    let schema = match name {
        "organization" => organization(),
        "inventory" => inventory(),
        "host" => host(),
        "credential" => credential(),
        "user" => user(),
        "team" => team(),
        "label" => label(),
        "job_template" => job_template(),
        "settings_misc_system" => settings_misc_system(),
        _ => return None,
    };
    Some(schema)
}

/// Every built-in schema, in [`names`] order.
#[must_use]
pub fn all() -> Vec<ResourceSchema> {
    NAMES.iter().filter_map(|name| lookup(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use awx_core::{AttrValue, AttributeSet};
    use std::collections::HashSet;

    #[test]
    fn every_name_resolves() {
        let schemas = all();
        assert_eq!(schemas.len(), names().len());
        assert!(lookup("workflow_job_template").is_none());
    }

    #[test]
    fn attribute_names_are_unique() {
        for schema in all() {
            let mut seen = HashSet::new();
            for spec in &schema.attributes {
                assert!(seen.insert(spec.name), "{} declares {} twice", schema.type_name, spec.name);
            }
        }
    }

    #[test]
    fn lookup_attributes_are_declared() {
        for schema in all() {
            for group in &schema.lookup_groups {
                for param in &group.params {
                    assert!(
                        schema.attribute_spec(param.attribute).is_some(),
                        "{} lookup {} uses undeclared {}",
                        schema.type_name,
                        group.name,
                        param.attribute
                    );
                }
            }
            assert_eq!(schema.singleton, schema.lookup_groups.is_empty(), "{}", schema.type_name);
        }
    }

    #[test]
    fn user_resolves_by_username() {
        let schema = user();
        let config = AttributeSet::new().with("username", AttrValue::string("admin"));
        let resolved = resolve(schema.endpoint, &schema.lookup_groups, &config).unwrap();
        assert_eq!(resolved.endpoint, "/api/v2/users/?username__exact=admin");
        assert!(schema.attribute_spec("password").unwrap().is_sensitive());
    }

    #[test]
    fn label_resolves_within_organization() {
        let schema = label();
        let config = AttributeSet::new()
            .with("name", AttrValue::string("prod"))
            .with("organization", AttrValue::int64(2));
        let resolved = resolve(schema.endpoint, &schema.lookup_groups, &config).unwrap();
        assert_eq!(resolved.endpoint, "/api/v2/labels/?name__exact=prod&organization=2");
    }

    #[test]
    fn job_template_extra_vars_is_structured_text() {
        let spec = *job_template().attribute_spec("extra_vars").unwrap();
        assert_eq!(spec.kind, Kind::JsonYamlText);
        assert!(spec.omit_if_empty);
    }

    #[test]
    fn association_endpoints() {
        assert_eq!(HOST_GROUP.endpoint(4), "/api/v2/hosts/4/groups/");
        assert_eq!(TEAM_ROLE.endpoint(1), "/api/v2/teams/1/roles/");
        assert_eq!(USER_ROLE.endpoint(1), "/api/v2/users/1/roles/");
        assert_eq!(JOB_TEMPLATE_CREDENTIAL.endpoint(8), "/api/v2/job_templates/8/credentials/");
    }
}
