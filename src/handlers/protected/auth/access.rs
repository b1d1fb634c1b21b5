use axum::extract::Path;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::identity::Rotation;
use crate::middleware::{ApiRejection, ApiResponse, AuthContext};
use crate::types::{Access, Resource};

/// GET /api/auth/access/:resource/:access - Check one permission for the caller
///
/// 200 when the caller's role grants it, 403 otherwise.
///
/// ```json
/// { "success": true, "data": { "resource": "challans", "access": "write", "role": "Pmanager", "allowed": true } }
/// ```
pub async fn access_check(
    Path((resource, access)): Path<(String, String)>,
    ctx: AuthContext,
) -> Result<(Rotation, ApiResponse<Value>), ApiRejection> {
    let checked = parse_requirement(&resource, &access)
        .and_then(|(resource, access)| ctx.require(resource, access).map(|_| (resource, access)));

    match checked {
        Ok((resource, access)) => Ok((
            ctx.rotation,
            ApiResponse::success(json!({
                "resource": resource,
                "access": access,
                "role": ctx.account.role,
                "allowed": true,
            })),
        )),
        Err(error) => Err(ApiRejection {
            error,
            rotation: ctx.rotation,
        }),
    }
}

fn parse_requirement(resource: &str, access: &str) -> Result<(Resource, Access), ApiError> {
    let resource = resource.parse().map_err(|e| ApiError::bad_request(format!("{}", e)))?;
    let access = access.parse().map_err(|e| ApiError::bad_request(format!("{}", e)))?;
    Ok((resource, access))
}
