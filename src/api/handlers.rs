//! Request handler for the catch-all lookup route.
//!
//! The path tail is the IP text itself: the empty path doubles as the
//! liveness probe and `favicon.ico` is answered with no content so browser
//! probes never reach the lookup path.

use actix_web::{web, HttpResponse, Responder};
use tracing::{debug, error};

use crate::api::models::LookupQuery;
use crate::service::GeoService;

const INVALID_IP_BODY: &str = r#"{"error": "Invalid IP format"}"#;

pub async fn lookup(
    geo: web::Data<GeoService>,
    path: web::Path<String>,
    query: web::Query<LookupQuery>,
) -> impl Responder {
    let ip = path.into_inner();

    if ip.is_empty() {
        return HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body("ok");
    }
    if ip == "favicon.ico" {
        return HttpResponse::NoContent().finish();
    }

    let lang = query.lang.as_deref().unwrap_or("");
    match geo.lookup(&ip, lang) {
        Ok(record) => {
            debug!("Lookup {} lang={:?} country={:?}", record.ip, lang, record.country_code);
            match serde_json::to_string_pretty(&record) {
                Ok(mut body) => {
                    body.push('\n');
                    HttpResponse::Ok()
                        .content_type("application/json; charset=utf-8")
                        .body(body)
                }
                Err(e) => {
                    error!("Failed to serialize record for {}: {}", record.ip, e);
                    HttpResponse::InternalServerError().finish()
                }
            }
        }
        // InvalidAddress is the only error the lookup path produces
        Err(e) => {
            debug!("Rejected lookup {:?}: {}", ip, e);
            HttpResponse::BadRequest()
                .content_type("application/json; charset=utf-8")
                .body(INVALID_IP_BODY)
        }
    }
}
