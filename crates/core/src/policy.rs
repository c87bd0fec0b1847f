//! Permission and visibility policy.
//!
//! Every resource has a read gate and a write gate, listed in one table.
//! [`authorize`] evaluates the gate for a request; [`visibility`] decides
//! whether a collection is narrowed to publicly visible rows.

use jardin_common::{AppError, AppResult};
use jardin_db::{
    entities::{user, user_profile},
    repositories::Visibility,
};

pub use jardin_db::entities::user_profile::Role;

/// Resource types guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Places.
    Place,
    /// Images attached to a place.
    PlaceMedia,
    /// Events.
    Event,
    /// Posts.
    Post,
    /// Reviews through the public endpoint (list and create).
    PublicReview,
    /// Reviews through the moderation endpoint.
    ModerationReview,
    /// Contact directory entries.
    ContactInfo,
    /// Gallery items.
    GalleryItem,
}

/// Kind of access a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// GET, HEAD and OPTIONS.
    Read,
    /// Any other method.
    Write,
}

impl Access {
    /// Classify an HTTP method name.
    #[must_use]
    pub fn from_method(method: &str) -> Self {
        if matches!(method, "GET" | "HEAD" | "OPTIONS") {
            Self::Read
        } else {
            Self::Write
        }
    }
}

/// Requirement a caller must meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Anyone, including anonymous callers.
    Public,
    /// Editors, admins and staff.
    EditorOrAdmin,
    /// Admins and staff.
    AdminOnly,
}

/// How a collection is narrowed for a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Full collection for callers passing the write gate, public rows otherwise.
    FollowsWriteGate,
    /// Full collection for staff only, public rows otherwise.
    StaffSeesAll,
    /// Public rows for everyone.
    AlwaysPublic,
    /// No narrowing; the read gate already restricts access.
    Unscoped,
}

/// One row of the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Gate for safe methods.
    pub read: Gate,
    /// Gate for every other method.
    pub write: Gate,
    /// Collection narrowing.
    pub scope: Scope,
}

/// The permission table.
#[must_use]
pub const fn rule(resource: Resource) -> Rule {
    use Gate::{AdminOnly, EditorOrAdmin, Public};
    use Scope::{AlwaysPublic, FollowsWriteGate, StaffSeesAll, Unscoped};

    let (read, write, scope) = match resource {
        Resource::Place | Resource::PlaceMedia | Resource::Event | Resource::Post => {
            (Public, EditorOrAdmin, FollowsWriteGate)
        }
        Resource::PublicReview => (Public, Public, AlwaysPublic),
        Resource::ModerationReview => (EditorOrAdmin, EditorOrAdmin, Unscoped),
        Resource::ContactInfo => (Public, AdminOnly, StaffSeesAll),
        Resource::GalleryItem => (Public, AdminOnly, FollowsWriteGate),
    };

    Rule { read, write, scope }
}

/// Who is making a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    /// Authenticated user, if any.
    pub user_id: Option<i64>,
    /// Staff flag of the user.
    pub is_staff: bool,
    /// Role from the user's profile, if one could be read.
    pub role: Option<Role>,
}

impl Caller {
    /// An unauthenticated caller.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            user_id: None,
            is_staff: false,
            role: None,
        }
    }

    /// An authenticated caller.
    #[must_use]
    pub const fn authenticated(user: &user::Model, role: Option<Role>) -> Self {
        Self {
            user_id: Some(user.id),
            is_staff: user.is_staff,
            role,
        }
    }

    /// Whether the caller presented a valid token.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Whether the caller meets `gate`, without distinguishing 401 from 403.
    #[must_use]
    pub fn passes(&self, gate: Gate) -> bool {
        self.check(gate).is_ok()
    }

    fn check(&self, gate: Gate) -> AppResult<()> {
        if gate == Gate::Public {
            return Ok(());
        }
        if !self.is_authenticated() {
            return Err(AppError::Unauthorized);
        }
        if self.is_staff {
            return Ok(());
        }

        let allowed = match gate {
            Gate::Public => true,
            Gate::EditorOrAdmin => matches!(self.role, Some(Role::Editor | Role::Admin)),
            Gate::AdminOnly => self.role == Some(Role::Admin),
        };

        if allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }
}

/// Role of an account given the result of its profile lookup.
///
/// A missing profile or a failed lookup means no role.
#[must_use]
pub fn resolve_role(lookup: AppResult<Option<user_profile::Model>>) -> Option<Role> {
    match lookup {
        Ok(profile) => profile.map(|p| p.role),
        Err(e) => {
            tracing::warn!(error = %e, "Profile lookup failed; continuing without a role");
            None
        }
    }
}

/// Decide whether `caller` may perform `access` on `resource`.
///
/// Anonymous callers failing a gate get [`AppError::Unauthorized`];
/// authenticated callers lacking the role get [`AppError::Forbidden`].
pub fn authorize(caller: &Caller, resource: Resource, access: Access) -> AppResult<()> {
    let rule = rule(resource);
    let gate = match access {
        Access::Read => rule.read,
        Access::Write => rule.write,
    };
    caller.check(gate)
}

/// Rows of `resource` the caller may see.
#[must_use]
pub fn visibility(caller: &Caller, resource: Resource) -> Visibility {
    let rule = rule(resource);
    match rule.scope {
        Scope::Unscoped => Visibility::All,
        Scope::AlwaysPublic => Visibility::PublicOnly,
        Scope::FollowsWriteGate if caller.passes(rule.write) => Visibility::All,
        Scope::FollowsWriteGate => Visibility::PublicOnly,
        Scope::StaffSeesAll if caller.is_authenticated() && caller.is_staff => Visibility::All,
        Scope::StaffSeesAll => Visibility::PublicOnly,
    }
}
