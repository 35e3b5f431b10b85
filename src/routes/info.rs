//! Version information.

use serde::Serialize;

use crate::pipeline::{Envelope, Router};

#[derive(Debug, Serialize)]
struct Info {
    name: &'static str,
    version: &'static str,
}

/// `GET /v1/info`
pub fn router() -> Router {
    Router::build("/v1", |r| {
        r.get("/info", |_ctx| async {
            Envelope::json(&Info {
                name: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
            })
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_route_registered() {
        let router = router();
        assert_eq!(router.routes().len(), 1);
        assert_eq!(router.routes()[0].path(), "/v1/info");
    }
}
