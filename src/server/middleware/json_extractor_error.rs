use actix_web::error::JsonPayloadError;
use actix_web::HttpRequest;

use crate::server::handler::ApiError;

/// Convert json extractor failures into the api's error body
pub(crate) fn json_extractor_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::ContentType => ApiError::InvalidJson.into(),
        JsonPayloadError::Deserialize(_) | JsonPayloadError::Serialize(_) => {
            ApiError::InvalidJson.into()
        }
        _ => ApiError::EmptyJson.into(),
    }
}
