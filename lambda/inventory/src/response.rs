use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Response};
use serde::Serialize;

/// Builds the `{ statusCode, headers, body }` envelope every route answers with.
pub fn json_response<T>(status: StatusCode, body: &T) -> Result<Response<Body>, Error>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_string(body)?;
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::Text(body))?)
}
