mod common;

// crates.io
use serde_json::json;
// self
use common::*;
use event_viewer::web::{
	DEFAULT_CATEGORY_ID, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, EventsController, IndexDefaults,
};

#[tokio::test]
async fn index_exposes_exactly_the_landing_fields() {
	let provider = Arc::new(StaticProvider::new("landing-token"));
	let controller = EventsController::new(provider.clone());
	let view = controller.index().await.expect("Index should succeed with a working provider.");

	assert_eq!(view.view, EventsController::INDEX_VIEW);
	assert_eq!(
		view.data.keys().collect::<Vec<_>>(),
		["accessToken", "categoryId", "latitude", "longitude"]
	);
	assert_eq!(view.data.get("accessToken"), Some(&json!("landing-token")));
	assert_eq!(view.data.get("categoryId"), Some(&json!(11881)));
	assert_eq!(view.data.get("latitude"), Some(&json!(47.384860)));
	assert_eq!(view.data.get("longitude"), Some(&json!(8.522303)));
	assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn index_uses_configured_defaults() {
	let defaults = IndexDefaults { category_id: 7, latitude: 51.5, longitude: -0.12 };
	let controller =
		EventsController::new(Arc::new(StaticProvider::new("token"))).with_defaults(defaults);
	let view = controller.index().await.expect("Index should succeed with a working provider.");

	assert_eq!(view.data.get("categoryId"), Some(&json!(7)));
	assert_eq!(view.data.get("latitude"), Some(&json!(51.5)));
	assert_eq!(view.data.get("longitude"), Some(&json!(-0.12)));
	assert_ne!(defaults.category_id, DEFAULT_CATEGORY_ID);
	assert_ne!(defaults.latitude, DEFAULT_LATITUDE);
	assert_ne!(defaults.longitude, DEFAULT_LONGITUDE);
}

#[tokio::test]
async fn index_propagates_token_failures() {
	let provider = Arc::new(FailingProvider::default());
	let controller = EventsController::new(provider.clone());
	let result = controller.index().await;

	expect_authentication(result);

	assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn listing_is_not_implemented_for_any_identifier() {
	let provider = Arc::new(StaticProvider::new("unused"));
	let controller = EventsController::new(provider.clone());

	for event_id in [0, 1, -1, i64::MAX, i64::MIN] {
		let err = controller
			.listing(event_id)
			.expect_err("Listing must fail the same way for every identifier.");

		assert!(err.is_not_implemented(), "Unexpected error for {event_id}: {err:?}.");
	}

	assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}
