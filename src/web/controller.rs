//! Events controller: builds the view data for each page.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::AccessTokenProvider,
	web::view::{ViewData, ViewResult},
};

/// Category shown on the landing page unless configured otherwise.
pub const DEFAULT_CATEGORY_ID: i64 = 11881;
/// Latitude the landing page searches around unless configured otherwise.
pub const DEFAULT_LATITUDE: f64 = 47.384860;
/// Longitude the landing page searches around unless configured otherwise.
pub const DEFAULT_LONGITUDE: f64 = 8.522303;

/// Static values placed on the landing page next to the token.
///
/// The coordinates are fixed per deployment, not derived from the request.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexDefaults {
	/// Event category identifier.
	pub category_id: i64,
	/// Latitude in degrees.
	pub latitude: f64,
	/// Longitude in degrees.
	pub longitude: f64,
}
impl IndexDefaults {
	/// Rejects non-finite or out-of-range coordinates.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let latitude_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
		let longitude_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);

		if latitude_ok && longitude_ok {
			Ok(())
		} else {
			Err(ConfigError::InvalidCoordinates { latitude: self.latitude, longitude: self.longitude })
		}
	}
}
impl Default for IndexDefaults {
	fn default() -> Self {
		Self {
			category_id: DEFAULT_CATEGORY_ID,
			latitude: DEFAULT_LATITUDE,
			longitude: DEFAULT_LONGITUDE,
		}
	}
}

/// Actions behind the event routes.
#[derive(Clone)]
pub struct EventsController {
	provider: Arc<dyn AccessTokenProvider>,
	defaults: IndexDefaults,
}
impl EventsController {
	/// View rendered by [`EventsController::index`].
	pub const INDEX_VIEW: &'static str = "index";

	/// Creates a controller that obtains tokens from `provider`.
	pub fn new(provider: Arc<dyn AccessTokenProvider>) -> Self {
		Self { provider, defaults: IndexDefaults::default() }
	}

	/// Overrides the landing page values.
	pub fn with_defaults(mut self, defaults: IndexDefaults) -> Self {
		self.defaults = defaults;

		self
	}

	/// Landing page: a fresh token plus the category and coordinates to search.
	pub async fn index(&self) -> Result<ViewResult> {
		let token = self.provider.access_token().await?;
		let mut data = ViewData::default();

		data.insert("accessToken", token.expose());
		data.insert("categoryId", self.defaults.category_id);
		data.insert("latitude", self.defaults.latitude);
		data.insert("longitude", self.defaults.longitude);

		Ok(ViewResult::new(Self::INDEX_VIEW, data))
	}

	/// Listing page for a single event. Not built yet, so every identifier fails the same way.
	pub fn listing(&self, event_id: i64) -> Result<ViewResult> {
		tracing::debug!(event_id, "Listing view requested.");

		Err(Error::NotImplemented { feature: "Listings view" })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_validate_coordinates() {
		assert!(IndexDefaults::default().validate().is_ok());

		let north_of_pole = IndexDefaults { latitude: 91.0, ..Default::default() };

		assert!(matches!(
			north_of_pole.validate(),
			Err(ConfigError::InvalidCoordinates { latitude, .. }) if latitude == 91.0
		));

		let not_a_number = IndexDefaults { longitude: f64::NAN, ..Default::default() };

		assert!(not_a_number.validate().is_err());
	}

	#[test]
	fn partial_tables_keep_remaining_defaults() {
		let defaults: IndexDefaults =
			toml::from_str("category_id = 7").expect("Partial index table should parse.");

		assert_eq!(defaults.category_id, 7);
		assert_eq!(defaults.latitude, DEFAULT_LATITUDE);
		assert_eq!(defaults.longitude, DEFAULT_LONGITUDE);
	}
}
