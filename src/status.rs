//! HTTP status codes as a typed enum.
//!
//! Only the codes this service answers with. Use [`Status`] anywhere a status
//! code is accepted: `Response::status()`, `Response::builder().status()`, or
//! the envelope writers.

/// Status codes the service produces.
#[allow(clippy::enum_variant_names)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200
    Created,             // 201
    NoContent,           // 204

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    NotFound,            // 404
    MethodNotAllowed,    // 405

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
    ServiceUnavailable,  // 503
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                  => 200,
            Status::Created             => 201,
            Status::NoContent           => 204,
            Status::BadRequest          => 400,
            Status::NotFound            => 404,
            Status::MethodNotAllowed    => 405,
            Status::InternalServerError => 500,
            Status::ServiceUnavailable  => 503,
        }
    }
}
