// app/src/web/response.rs

use actix_web::HttpResponse;
use serde::Serialize;

/// Success envelope: `{ "data": ..., "message": ... }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
  pub data: T,
  pub message: String,
}

pub fn ok<T: Serialize>(data: T, message: &str) -> HttpResponse {
  HttpResponse::Ok().json(Envelope {
    data,
    message: message.to_string(),
  })
}

pub fn created<T: Serialize>(data: T, message: &str) -> HttpResponse {
  HttpResponse::Created().json(Envelope {
    data,
    message: message.to_string(),
  })
}
