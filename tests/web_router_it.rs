mod common;

// crates.io
use axum::{
	body::{self, Body},
	http::{Request, StatusCode},
	response::Response,
};
use tower::ServiceExt;
// self
use common::*;
use event_viewer::{
	provider::AccessTokenProvider,
	web::{self, AppState, EventsController, HtmlRenderer},
};

fn state(provider: Arc<dyn AccessTokenProvider>) -> AppState {
	AppState::new(EventsController::new(provider), Arc::new(HtmlRenderer::default()))
}

async fn get(state: AppState, uri: &str) -> Response {
	web::router(state)
		.oneshot(Request::builder().uri(uri).body(Body::empty()).expect("Request should build."))
		.await
		.expect("Router is infallible.")
}

async fn body_text(response: Response) -> String {
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");

	String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8.")
}

#[tokio::test]
async fn landing_page_embeds_view_data() {
	let response = get(state(Arc::new(StaticProvider::new("page-token"))), "/").await;

	assert_eq!(response.status(), StatusCode::OK);
	assert!(
		response
			.headers()
			.get("content-type")
			.and_then(|value| value.to_str().ok())
			.is_some_and(|value| value.starts_with("text/html"))
	);

	let html = body_text(response).await;

	assert!(html.contains("id=\"view-data\""));
	assert!(html.contains("\"accessToken\":\"page-token\""));
	assert!(html.contains("\"categoryId\":11881"));
}

#[tokio::test]
async fn token_failures_become_generic_server_errors() {
	let response = get(state(Arc::new(FailingProvider::default())), "/").await;

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

	let html = body_text(response).await;

	assert!(!html.contains("connection refused"));
}

#[tokio::test]
async fn listing_route_is_not_implemented() {
	for uri in ["/0", "/42", "/-1"] {
		let response = get(state(Arc::new(StaticProvider::new("unused"))), uri).await;

		assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED, "Unexpected status for {uri}.");
	}
}

#[tokio::test]
async fn non_numeric_event_ids_are_rejected() {
	let response = get(state(Arc::new(StaticProvider::new("unused"))), "/tomorrow").await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_check_skips_the_token_endpoint() {
	let provider = Arc::new(FailingProvider::default());
	let response = get(state(provider.clone()), "/healthz").await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_text(response).await, "ok");
	assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}
