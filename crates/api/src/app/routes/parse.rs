use axum::Json;

use crate::app::body::RequestBody;
use crate::app::dto::ParseDataResponse;

pub async fn parse_data(RequestBody(received): RequestBody) -> Json<ParseDataResponse> {
    Json(ParseDataResponse {
        message: "Data parsed successfully",
        received,
    })
}
