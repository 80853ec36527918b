//! Service/integration catalog endpoint.

use axum::response::Json;

use crate::auth::{OperatorAuth, UserHeader};
use crate::catalog::{CatalogEntry, catalog};
use crate::error::ApiError;

/// Every service/integration pair and whether it can be connected
#[utoipa::path(
    get,
    path = "/services",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Catalog of services and integrations", body = [CatalogEntry]),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "catalog"
)]
pub async fn list_services(_operator_auth: OperatorAuth) -> Json<Vec<CatalogEntry>> {
    Json(catalog())
}
