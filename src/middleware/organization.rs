use crate::auth::{ResolvedIdentity, ORG_CREATION_PATH};

/// Outcome of the organization guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No identity to judge; the caller decides
    NoVerdict,
    Proceed,
    Redirect(&'static str),
}

/// Keep org-less users away from everything but organization creation.
///
/// Never produces a 401; an absent identity is left to the caller.
pub fn organization_guard(identity: Option<&ResolvedIdentity>, path: &str) -> Verdict {
    let Some(identity) = identity else {
        return Verdict::NoVerdict;
    };

    if identity.org_id.is_none() && !is_org_creation_path(path) {
        return Verdict::Redirect(ORG_CREATION_PATH);
    }

    Verdict::Proceed
}

/// `/dashboard/organization/new` and anything below it, but not
/// `/dashboard/organization/newer`
fn is_org_creation_path(path: &str) -> bool {
    match path.strip_prefix(ORG_CREATION_PATH) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
