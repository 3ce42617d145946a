use actix_web::{HttpResponse, web};

use crate::error::ApiError;
use crate::middleware::Deadline;
use crate::routes::Ledger;

#[actix_web::get("/user/{id}")]
pub async fn recent_operations(
    ledger: web::Data<dyn Ledger>,
    deadline: Deadline,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let raw = path.into_inner();
    let user_id: i32 = raw
        .parse()
        .map_err(|err| ApiError::BadRequest(format!("invalid user id `{raw}`: {err}")))?;

    let operations = deadline.run(ledger.recent_operations(user_id)).await?;
    Ok(HttpResponse::Ok().json(operations))
}
