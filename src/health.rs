//! Health-check handlers.
//!
//! | Check | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can the store answer a query? |

use std::sync::Arc;

use tracing::warn;

use crate::api::{self, AppState};
use crate::envelope;
use crate::{Request, Response, Status};

/// Always `200 OK` with body `"ok"`. No dependencies.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// `200 OK` with body `"ready"` when the store answers a ping, otherwise a
/// `503` error envelope.
pub async fn readiness(state: Arc<AppState>, _req: Request) -> Response {
    match api::blocking(&state, |store| store.ping()).await {
        Ok(()) => Response::text("ready"),
        Err(e) => {
            warn!("readiness check failed: {e}");
            envelope::error(Status::ServiceUnavailable, e)
        }
    }
}
