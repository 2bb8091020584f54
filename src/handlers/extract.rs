// Request body extractors.
//
// Rejections are converted into `ApiError` so malformed bodies get the same
// JSON envelope as every other API failure.

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::header,
    Form, Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// JSON body that has been deserialized and validated
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!("Rejected JSON body: {}", rejection.body_text());
            ApiError::invalid_json(rejection.body_text())
        })?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Body submitted either by the client application (JSON) or by a plain
/// HTML form (`application/x-www-form-urlencoded`). Validated either way.
#[derive(Debug, Clone)]
pub enum Submission<T> {
    Json(T),
    Form(T),
}

impl<T> Submission<T> {
    pub fn is_form(&self) -> bool {
        matches!(self, Submission::Form(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Submission::Json(value) | Submission::Form(value) => value,
        }
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for Submission<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if !is_form {
            let ValidatedJson(value) = ValidatedJson::<T>::from_request(req, state).await?;
            return Ok(Submission::Json(value));
        }

        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        value.validate()?;
        Ok(Submission::Form(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Greeting {
        #[validate(length(min = 2, message = "Name is too short"))]
        name: String,
        #[serde(default)]
        loud: bool,
    }

    fn request(content_type: &str, body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn malformed_json_becomes_invalid_json() {
        let err = ValidatedJson::<Greeting>::from_request(request("application/json", "{"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_JSON");

        let err = ValidatedJson::<Greeting>::from_request(request("application/json", "{}"), &())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_JSON");
        assert!(err.message().contains("name"));
    }

    #[tokio::test]
    async fn missing_content_type_is_invalid_json() {
        let err = ValidatedJson::<Greeting>::from_request(request("text/plain", "{}"), &())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_JSON");
    }

    #[tokio::test]
    async fn validation_failures_list_fields() {
        let err = ValidatedJson::<Greeting>::from_request(
            request("application/json", r#"{"name":"x"}"#),
            &(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.to_json()["field_errors"]["name"], "Name is too short");
    }

    #[tokio::test]
    async fn form_and_json_submissions() {
        let form = Submission::<Greeting>::from_request(
            request("application/x-www-form-urlencoded", "name=Ada&loud=true"),
            &(),
        )
        .await
        .unwrap();
        assert!(form.is_form());
        let greeting = form.into_inner();
        assert_eq!(greeting.name, "Ada");
        assert!(greeting.loud);

        let json = Submission::<Greeting>::from_request(
            request("application/json", r#"{"name":"Ada"}"#),
            &(),
        )
        .await
        .unwrap();
        assert!(!json.is_form());

        let err = Submission::<Greeting>::from_request(
            request("application/x-www-form-urlencoded", "name=A"),
            &(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
