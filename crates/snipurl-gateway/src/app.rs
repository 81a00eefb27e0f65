use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    batch_shorten_handler, delete_user_urls_handler, list_user_urls_handler, ping_handler,
    redirect_handler, shorten_json_handler, shorten_text_handler, stats_handler,
};
use crate::middleware::trusted_subnet;
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", post(shorten_text_handler))
            .route("/ping", get(ping_handler))
            .route("/{id}", get(redirect_handler))
            .nest(
                "/api",
                Router::new()
                    .route("/shorten", post(shorten_json_handler))
                    .route("/shorten/batch", post(batch_shorten_handler))
                    .route(
                        "/user/urls",
                        get(list_user_urls_handler).delete(delete_user_urls_handler),
                    )
                    .route(
                        "/internal/stats",
                        get(stats_handler)
                            .route_layer(from_fn_with_state(state.clone(), trusted_subnet)),
                    ),
            )
            .layer(RequestDecompressionLayer::new())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::REAL_IP_HEADER;
    use crate::owner::USER_ID_HEADER;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use snipurl_hasher::Md5Hasher;
    use snipurl_snipper::{SnipperService, SnipperSettings};
    use snipurl_storage::InMemoryStore;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const BASE_URL: &str = "http://localhost:8080";
    const TRUSTED_SUBNET: &str = "10.0.0.7";

    fn router() -> Router {
        let service = SnipperService::new(
            InMemoryStore::new(),
            Md5Hasher::default(),
            SnipperSettings::default(),
        );
        App::router(
            AppState::new(Arc::new(service), BASE_URL)
                .with_trusted_subnet(Some(TRUSTED_SUBNET.to_string())),
        )
    }

    fn request(method: Method, uri: &str, owner: Option<&str>, body: Body) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(owner) = owner {
            builder = builder.header(USER_ID_HEADER, owner);
        }
        builder.body(body).unwrap()
    }

    fn json_request(method: Method, uri: &str, owner: Option<&str>, body: Value) -> Request<Body> {
        let mut request = request(method, uri, owner, Body::from(body.to_string()));
        request.headers_mut().insert(
            header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );
        request
    }

    fn stats_request(real_ip: Option<&str>) -> Request<Body> {
        let mut request = request(Method::GET, "/api/internal/stats", None, Body::empty());
        if let Some(real_ip) = real_ip {
            request
                .headers_mut()
                .insert(REAL_IP_HEADER, real_ip.parse().unwrap());
        }
        request
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn text_shorten_then_conflict() {
        let app = router();

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/", None, Body::from("https://example.com")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_text(response).await, "http://localhost:8080/c984d06a");

        let response = app
            .oneshot(request(Method::POST, "/", None, Body::from("https://example.com")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_text(response).await, "http://localhost:8080/c984d06a");
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let response = router()
            .oneshot(request(Method::POST, "/", None, Body::from("  ")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn json_shorten_and_redirect() {
        let app = router();

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/shorten",
                None,
                json!({ "url": "https://example.org" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await,
            json!({ "result": "http://localhost:8080/5564fd6a" })
        );

        let response = app
            .oneshot(request(Method::GET, "/5564fd6a", None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://example.org"
        );
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let app = router();

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/deadbeef", None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(request(Method::GET, "/bad!code", None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn batch_answers_in_request_order() {
        let response = router()
            .oneshot(json_request(
                Method::POST,
                "/api/shorten/batch",
                Some("alice"),
                json!([
                    { "correlation_id": "b", "original_url": "https://example.org" },
                    { "correlation_id": "a", "original_url": "https://example.com" },
                ]),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await,
            json!([
                { "correlation_id": "b", "short_url": "http://localhost:8080/5564fd6a" },
                { "correlation_id": "a", "short_url": "http://localhost:8080/c984d06a" },
            ])
        );
    }

    #[tokio::test]
    async fn user_urls_require_identity() {
        let app = router();

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/user/urls", None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/user/urls", Some("alice"), Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        app.clone()
            .oneshot(request(
                Method::POST,
                "/",
                Some("alice"),
                Body::from("https://example.com"),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(request(Method::GET, "/api/user/urls", Some("alice"), Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!([
                { "short_url": "http://localhost:8080/c984d06a", "original_url": "https://example.com" }
            ])
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn deleted_urls_are_gone() {
        let app = router();
        app.clone()
            .oneshot(request(
                Method::POST,
                "/",
                Some("alice"),
                Body::from("https://example.com"),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                Method::DELETE,
                "/api/user/urls",
                Some("alice"),
                json!(["c984d06a"]),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        awaitility::at_most(Duration::from_secs(2))
            .poll_interval(Duration::from_millis(10))
            .until_async(|| async {
                let response = app
                    .clone()
                    .oneshot(request(Method::GET, "/c984d06a", None, Body::empty()))
                    .await
                    .unwrap();
                response.status() == StatusCode::GONE
            })
            .await;
    }

    #[tokio::test]
    async fn stats_and_ping() {
        let app = router();
        for (owner, url) in [
            ("alice", "https://example.com"),
            ("alice", "https://example.org"),
            ("bob", "https://example.com/a"),
        ] {
            app.clone()
                .oneshot(request(Method::POST, "/", Some(owner), Body::from(url)))
                .await
                .unwrap();
        }

        let response = app
            .clone()
            .oneshot(stats_request(Some(TRUSTED_SUBNET)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "urls": 3, "users": 2 }));

        // The in-memory backend has no database behind it.
        let response = app
            .oneshot(request(Method::GET, "/ping", None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn stats_refuse_untrusted_callers() {
        let app = router();

        let response = app.clone().oneshot(stats_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(stats_request(Some("192.168.1.1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app.oneshot(stats_request(Some(TRUSTED_SUBNET))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn stats_closed_without_trusted_subnet() {
        let service = SnipperService::new(
            InMemoryStore::new(),
            Md5Hasher::default(),
            SnipperSettings::default(),
        );
        let app = App::router(AppState::new(Arc::new(service), BASE_URL));

        let response = app.oneshot(stats_request(Some(TRUSTED_SUBNET))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn gzip_bodies_are_decompressed() {
        // gzip of "https://example.com"
        const GZIPPED: [u8; 39] = [
            0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03, 0xcb, 0x28, 0x29, 0x29,
            0x28, 0xb6, 0xd2, 0xd7, 0x4f, 0xad, 0x48, 0xcc, 0x2d, 0xc8, 0x49, 0xd5, 0x4b, 0xce,
            0xcf, 0x05, 0x00, 0xdb, 0x5c, 0x29, 0xff, 0x13, 0x00, 0x00, 0x00,
        ];

        let mut request = request(Method::POST, "/", None, Body::from(GZIPPED.to_vec()));
        request
            .headers_mut()
            .insert(header::CONTENT_ENCODING, "gzip".parse().unwrap());

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_text(response).await, "http://localhost:8080/c984d06a");
    }
}
