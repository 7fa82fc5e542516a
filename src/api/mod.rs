//! # Dev HTTP Surface
//!
//! Mounts the engine under `/v1/datadog/` so it can be driven over HTTP
//! without a host. `GET` reads (`?list=true` lists, `?help=true` returns
//! help), `POST`/`PUT` writes, `DELETE` deletes. Leases are renewed and
//! revoked by posting the lease back to `/_lease/renew` and `/_lease/revoke`.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, AppState, MOUNT_PREFIX};
pub use server::start_api_server;
