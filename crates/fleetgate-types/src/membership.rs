//! Membership payload delivered by the membership-fetch service.
//!
//! The shapes mirror the backend JSON. Every collection is decoded with
//! [`crate::lenient::seq`] and every grant string with
//! [`crate::lenient::opt_string`], so malformed entries degrade to "no
//! grant" instead of failing the payload.
//!
//! Coarse grants ([`Permission`]) and fine-grained grants
//! ([`TenantPermission`]) are distinct record types. They meet only through
//! their [`GrantKey`], exposed by the [`Grant`] trait.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::{AppModuleId, GrantKey, MembershipId, RoleId, TenantId, TenantSlug};

/// A `subject_class` / `action` pair carried by a grant record.
pub trait Grant {
    /// Raw subject class, if present.
    fn subject_class(&self) -> Option<&str>;

    /// Raw action, if present.
    fn action(&self) -> Option<&str>;

    /// Normalized key, or `None` when the subject or action is missing/blank.
    fn grant_key(&self) -> Option<GrantKey> {
        GrantKey::new(self.subject_class()?, self.action()?)
    }

    /// Returns whether this grant applies to `key` (case-insensitive).
    fn matches(&self, key: &GrantKey) -> bool {
        self.grant_key().is_some_and(|k| &k == key)
    }
}

/// Application module: a licensable feature area (e.g. `fleet`, `maintenance`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppModule {
    #[serde(default)]
    pub id: AppModuleId,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub key: Option<String>,
}

impl AppModule {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: AppModuleId::default(),
            name: Some(name.into()),
            key: Some(key.into()),
        }
    }

    /// Normalized module key, falling back to the name when the key is absent.
    ///
    /// Returns `None` when neither is usable.
    pub fn resolved_key(&self) -> Option<String> {
        [self.key.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(crate::normalize)
            .find(|k| !k.is_empty())
    }
}

/// Coarse grant: the role may perform `action` on `subject_class`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Permission {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub subject_class: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub action: Option<String>,
    #[serde(default)]
    pub app_module: Option<AppModule>,
}

impl Permission {
    pub fn new(subject_class: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            subject_class: Some(subject_class.into()),
            action: Some(action.into()),
            app_module: None,
        }
    }

    /// Attaches the module this grant belongs to.
    pub fn in_module(mut self, module: AppModule) -> Self {
        self.app_module = Some(module);
        self
    }
}

impl Grant for Permission {
    fn subject_class(&self) -> Option<&str> {
        self.subject_class.as_deref()
    }

    fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

/// Fine-grained grant restricting which attributes of a subject are readable.
///
/// Empty lists mean "no restriction from this side".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TenantPermission {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub subject_class: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub allow_attributes: Vec<String>,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub deny_attributes: Vec<String>,
}

impl TenantPermission {
    pub fn new(subject_class: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            subject_class: Some(subject_class.into()),
            action: Some(action.into()),
            allow_attributes: Vec::new(),
            deny_attributes: Vec::new(),
        }
    }

    /// Adds attributes to the whitelist.
    pub fn allow<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_attributes
            .extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Adds attributes to the blacklist.
    pub fn deny<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny_attributes
            .extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Whitelist entries, with blank names removed.
    pub fn allowed(&self) -> impl Iterator<Item = &str> {
        non_blank(&self.allow_attributes)
    }

    /// Blacklist entries, with blank names removed.
    pub fn denied(&self) -> impl Iterator<Item = &str> {
        non_blank(&self.deny_attributes)
    }

    /// Returns whether this grant carries a (non-blank) whitelist.
    pub fn has_allow_list(&self) -> bool {
        self.allowed().next().is_some()
    }

    /// Returns whether this grant carries a (non-blank) blacklist.
    pub fn has_deny_list(&self) -> bool {
        self.denied().next().is_some()
    }
}

impl Grant for TenantPermission {
    fn subject_class(&self) -> Option<&str> {
        self.subject_class.as_deref()
    }

    fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

fn non_blank(items: &[String]) -> impl Iterator<Item = &str> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// A named bundle of grants held through a membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Role {
    #[serde(default)]
    pub id: RoleId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub permissions: Vec<Permission>,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub tenant_permissions: Vec<TenantPermission>,
}

impl Role {
    pub fn new(id: u64, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            id: RoleId::new(id),
            name: key.clone(),
            key,
            permissions: Vec::new(),
            tenant_permissions: Vec::new(),
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn with_tenant_permission(mut self, permission: TenantPermission) -> Self {
        self.tenant_permissions.push(permission);
        self
    }
}

/// A module licensed to a tenant, independent of any user's grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TenantModule {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub app_module: AppModule,
}

impl TenantModule {
    pub fn new(app_module: AppModule, active: bool) -> Self {
        Self {
            id: 0,
            active,
            app_module,
        }
    }
}

/// A tenant (fleet operator) and the modules it has licensed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Tenant {
    #[serde(default)]
    pub id: TenantId,
    pub slug: TenantSlug,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub modules: Vec<TenantModule>,
}

impl Tenant {
    pub fn new(id: u64, slug: impl Into<TenantSlug>) -> Self {
        let slug = slug.into();
        Self {
            id: TenantId::new(id),
            name: slug.to_string(),
            slug,
            modules: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: TenantModule) -> Self {
        self.modules.push(module);
        self
    }
}

/// A person's membership in one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    #[serde(default)]
    pub id: MembershipId,
    #[serde(default = "default_active")]
    pub active: bool,
    pub tenant: Tenant,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub roles: Vec<Role>,
}

fn default_active() -> bool {
    true
}

impl Membership {
    pub fn new(id: u64, tenant: Tenant) -> Self {
        Self {
            id: MembershipId::new(id),
            active: true,
            tenant,
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Every coarse grant across all roles.
    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.roles.iter().flat_map(|r| r.permissions.iter())
    }

    /// Every fine-grained grant across all roles.
    pub fn tenant_permissions(&self) -> impl Iterator<Item = &TenantPermission> {
        self.roles.iter().flat_map(|r| r.tenant_permissions.iter())
    }
}

/// Decodes the membership list returned by the fetch service.
///
/// Accepts either a bare JSON array or an object with a `memberships` field.
/// Individual malformed memberships are dropped.
///
/// # Errors
///
/// Returns the underlying `serde_json` error if the document itself is not
/// valid JSON or has neither accepted shape.
pub fn decode_memberships(json: &str) -> Result<Vec<Membership>, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Envelope {
        Wrapped {
            #[serde(deserialize_with = "lenient::seq")]
            memberships: Vec<Membership>,
        },
        Bare(#[serde(deserialize_with = "lenient::seq")] Vec<Membership>),
    }

    let envelope: Envelope = serde_json::from_str(json)?;
    Ok(match envelope {
        Envelope::Wrapped { memberships } | Envelope::Bare(memberships) => memberships,
    })
}
