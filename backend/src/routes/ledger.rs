use actix_web::{HttpResponse, web};
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::Deadline;
use crate::routes::Ledger;

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub sender: i32,
    pub recipient: i32,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplenishmentRequest {
    pub recipient: i32,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub result: String,
}

impl SuccessResponse {
    fn success() -> Self {
        Self {
            result: "success".to_string(),
        }
    }
}

#[actix_web::post("/payment")]
pub async fn payment(
    ledger: web::Data<dyn Ledger>,
    deadline: Deadline,
    req: web::Json<PaymentRequest>,
) -> Result<HttpResponse, ApiError> {
    let PaymentRequest {
        sender,
        recipient,
        amount,
    } = req.into_inner();

    let operation = deadline
        .run(ledger.payment(sender, recipient, amount))
        .await?;

    info!(
        "payment {} of {} from user {} to user {}",
        operation.id, amount, sender, recipient
    );
    Ok(HttpResponse::Ok().json(SuccessResponse::success()))
}

#[actix_web::post("/replenishment")]
pub async fn replenishment(
    ledger: web::Data<dyn Ledger>,
    deadline: Deadline,
    req: web::Json<ReplenishmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let ReplenishmentRequest { recipient, amount } = req.into_inner();

    let operation = deadline
        .run(ledger.replenishment_balance(recipient, amount))
        .await?;

    info!(
        "replenishment {} of {} to user {}",
        operation.id, amount, recipient
    );
    Ok(HttpResponse::Ok().json(SuccessResponse::success()))
}
