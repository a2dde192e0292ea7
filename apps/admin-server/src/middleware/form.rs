//! `application/x-www-form-urlencoded` request bodies.

use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;

use super::error::AppError;

/// Form body extractor.
///
/// Unlike `web::Form`, repeated keys (`tags=1&tags=2`) deserialize into
/// sequences, and failures render the HTML error page.
#[derive(Debug)]
pub struct HtmlForm<T>(pub T);

impl<T> HtmlForm<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Check that the request declares a form body.
pub fn check_form_content_type(req: &HttpRequest) -> Result<(), AppError> {
    let mime = req.mime_type().map_err(|e| AppError::BadRequest(e.to_string()))?;

    match mime {
        Some(mime) if mime.essence_str() == FORM_CONTENT_TYPE => Ok(()),
        Some(mime) => Err(AppError::BadRequest(format!(
            "The `Content-Type` header was set to `{mime}`. Expected `application/x-www-form-urlencoded`."
        ))),
        None => Err(AppError::BadRequest(
            "The `Content-Type` header is missing. Expected `application/x-www-form-urlencoded`."
                .to_string(),
        )),
    }
}

/// Deserialize a buffered form body.
pub fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_html_form::from_bytes(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

impl<T> FromRequest for HtmlForm<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let content_type = check_form_content_type(req);
        let body = web::Bytes::from_request(req, payload);

        Box::pin(async move {
            content_type?;
            let body = body
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            parse(&body).map(HtmlForm)
        })
    }
}
