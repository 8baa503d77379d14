// Route guard: per-request authorization decision
// Decision: Static path classification, public exceptions checked first
// Decision: Only two outcomes exist (allow or redirect); nothing here can fail the request
// Decision: Prefix matching is segment-aware so "/administrator" is not "/admin"

use chrono::{DateTime, Utc};

use crate::principal::{Principal, Role};
use crate::session::SessionCodec;

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";
pub const ADMIN_HOME_PATH: &str = "/admin";
pub const REGISTER_PATH: &str = "/cadastro";

/// Reachable without a session, regardless of the other lists
const ALWAYS_PUBLIC: &[&str] = &[
    ADMIN_LOGIN_PATH,
    LOGIN_PATH,
    REGISTER_PATH,
    "/recuperar-senha",
    "/redefinir-senha",
];

const ADMIN_PREFIXES: &[&str] = &[ADMIN_HOME_PATH];

/// Company routes that operate on the linked company record
const COMPANY_LINKED_PREFIXES: &[&str] =
    &["/dashboard", "/api/upload", "/api/produtos", "/api/arquivos"];

/// Company account routes; usable before the company record exists
const COMPANY_ACCOUNT_PREFIXES: &[&str] = &[
    "/api/auth/update-email",
    "/api/auth/update-password",
    "/api/auth/delete-account",
];

/// Static classification of a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    ProtectedCompany { requires_company_link: bool },
    ProtectedAdmin,
}

impl RouteClass {
    pub fn classify(path: &str) -> Self {
        if ALWAYS_PUBLIC.iter().any(|p| matches_prefix(path, p)) {
            return RouteClass::Public;
        }
        if ADMIN_PREFIXES.iter().any(|p| matches_prefix(path, p)) {
            return RouteClass::ProtectedAdmin;
        }
        if COMPANY_LINKED_PREFIXES.iter().any(|p| matches_prefix(path, p)) {
            return RouteClass::ProtectedCompany {
                requires_company_link: true,
            };
        }
        if COMPANY_ACCOUNT_PREFIXES
            .iter()
            .any(|p| matches_prefix(path, p))
        {
            return RouteClass::ProtectedCompany {
                requires_company_link: false,
            };
        }
        RouteClass::Public
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, RouteClass::Public)
    }

    /// Login page for unauthenticated visitors of this class
    pub fn login_path(&self) -> &'static str {
        match self {
            RouteClass::ProtectedAdmin => ADMIN_LOGIN_PATH,
            RouteClass::ProtectedCompany { .. } | RouteClass::Public => LOGIN_PATH,
        }
    }
}

/// Where a freshly logged-in principal should land
pub fn landing_path(principal: &Principal) -> &'static str {
    match principal.role() {
        Role::Admin => ADMIN_HOME_PATH,
        Role::Company if principal.has_linked_company() => "/dashboard",
        Role::Company => REGISTER_PATH,
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Outcome of the guard for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Continue to the handler; the principal is present for protected routes
    Allow { principal: Option<Principal> },
    /// Send the visitor elsewhere, optionally deleting a stale session cookie
    Redirect {
        to: &'static str,
        clear_cookie: bool,
    },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow { .. })
    }

    fn redirect(to: &'static str) -> Self {
        GuardDecision::Redirect {
            to,
            clear_cookie: false,
        }
    }
}

/// Decides allow/redirect from the request path and the raw session cookie
#[derive(Clone, Debug)]
pub struct RouteGuard {
    codec: SessionCodec,
}

impl RouteGuard {
    pub fn new(codec: SessionCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    pub fn evaluate(&self, path: &str, token: Option<&str>) -> GuardDecision {
        self.evaluate_at(path, token, Utc::now())
    }

    pub fn evaluate_at(
        &self,
        path: &str,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> GuardDecision {
        let class = RouteClass::classify(path);
        if !class.is_protected() {
            return GuardDecision::Allow { principal: None };
        }

        let Some(token) = token else {
            tracing::debug!(path, "No session on protected route");
            return GuardDecision::redirect(class.login_path());
        };

        let principal = match self.codec.decode_at(token, now) {
            Ok(principal) => principal,
            Err(e) => {
                tracing::debug!(path, error = %e, "Discarding unusable session cookie");
                return GuardDecision::Redirect {
                    to: class.login_path(),
                    clear_cookie: true,
                };
            }
        };

        authorize(class, principal, path)
    }
}

fn authorize(class: RouteClass, principal: Principal, path: &str) -> GuardDecision {
    let decision = match (class, principal.role()) {
        (RouteClass::Public, _) | (RouteClass::ProtectedAdmin, Role::Admin) => None,
        (RouteClass::ProtectedAdmin, Role::Company) => Some(LOGIN_PATH),
        (RouteClass::ProtectedCompany { .. }, Role::Admin) => Some(ADMIN_HOME_PATH),
        (
            RouteClass::ProtectedCompany {
                requires_company_link,
            },
            Role::Company,
        ) => {
            if requires_company_link && !principal.has_linked_company() {
                Some(REGISTER_PATH)
            } else {
                None
            }
        }
    };

    match decision {
        None => GuardDecision::Allow {
            principal: Some(principal),
        },
        Some(to) => {
            tracing::debug!(
                path,
                identity_id = %principal.id(),
                role = %principal.role(),
                redirect = to,
                "Role not allowed on route"
            );
            GuardDecision::redirect(to)
        }
    }
}
