// Server-rendered page shells.
//
// Protected pages sit behind the gatekeeper; the client application renders
// the content and calls the JSON API. Templates are autoescaped.

use axum::{extract::Query, http::Uri, response::Html};
use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};

use crate::auth::{RequireAuth, ORG_CREATION_PATH};
use crate::error::ApiError;

fn templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("layout.html", include_str!("../../templates/layout.html"))?;
    env.add_template("signin.html", include_str!("../../templates/signin.html"))?;
    env.add_template("app.html", include_str!("../../templates/app.html"))?;
    Ok(env)
}

fn render<S: Serialize>(name: &str, ctx: S) -> Result<Html<String>, ApiError> {
    templates()
        .and_then(|env| env.get_template(name)?.render(ctx))
        .map(Html)
        .map_err(|e| {
            tracing::error!("Failed to render {}: {}", name, e);
            ApiError::internal_server_error("Failed to render page")
        })
}

#[derive(Debug, Default, Deserialize)]
pub struct SignInPageQuery {
    pub error: Option<String>,
}

/// Sign-in form. It posts urlencoded to the sign-in API, which redirects back
/// here with `?error=` on bad credentials.
pub async fn sign_in_page(Query(query): Query<SignInPageQuery>) -> Result<Html<String>, ApiError> {
    render(
        "signin.html",
        context! {
            title => "Sign in",
            error => query.error.is_some(),
        },
    )
}

pub async fn app_page(
    RequireAuth(identity): RequireAuth,
    uri: Uri,
) -> Result<Html<String>, ApiError> {
    let page = if uri.path() == ORG_CREATION_PATH {
        "organization-new"
    } else {
        "app"
    };

    render(
        "app.html",
        context! {
            title => "ProductiveFlow",
            page => page,
            path => uri.path(),
            user => identity.name.as_deref().unwrap_or(&identity.email),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_values_are_escaped() {
        let Html(page) = render(
            "app.html",
            context! {
                title => "ProductiveFlow",
                page => "app",
                path => "/dashboard",
                user => r#"<b>"Tom" & Jerry</b>"#,
            },
        )
        .unwrap();
        assert!(page.contains("&lt;b&gt;"));
        assert!(!page.contains("<b>"));
        assert!(page.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn sign_in_form_targets_the_api() {
        let Html(page) = render(
            "signin.html",
            context! { title => "Sign in", error => false },
        )
        .unwrap();
        assert!(page.contains(r#"action="/api/auth/signin""#));
        assert!(page.contains(r#"name="email""#));
        assert!(page.contains(r#"name="remember" value="true""#));
        assert!(!page.contains("role=\"alert\""));

        let Html(page) =
            render("signin.html", context! { title => "Sign in", error => true }).unwrap();
        assert!(page.contains("Invalid email or password"));
    }
}
