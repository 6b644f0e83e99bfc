//! View data and rendering.

// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

/// Named fields handed from a controller action to the renderer.
///
/// Built fresh for each request and dropped once the page is rendered.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViewData(BTreeMap<String, Value>);
impl ViewData {
	/// Sets `key` to `value`, replacing any previous value.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		self.0.insert(key.into(), value.into());
	}

	/// Returns the value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Field names in sorted order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	/// Number of fields.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no field is set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// A named view plus the data it is rendered with.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewResult {
	/// View name, e.g. `index`.
	pub view: &'static str,
	/// Fields exposed to the view.
	pub data: ViewData,
}
impl ViewResult {
	/// Pairs a view name with its data.
	pub fn new(view: &'static str, data: ViewData) -> Self {
		Self { view, data }
	}
}

/// Turns a [`ViewResult`] into a response body.
pub trait ViewRenderer
where
	Self: Send + Sync,
{
	/// Renders `view` to HTML.
	fn render(&self, view: &ViewResult) -> Result<String>;
}

/// Renders a minimal HTML shell with the view data embedded as a JSON document.
///
/// Client-side scripts read `<script id="view-data">` to call the ticketing API with the token.
#[derive(Clone, Debug)]
pub struct HtmlRenderer {
	title: String,
}
impl HtmlRenderer {
	/// Creates a renderer that uses `title` for every page.
	pub fn new(title: impl Into<String>) -> Self {
		Self { title: title.into() }
	}
}
impl Default for HtmlRenderer {
	fn default() -> Self {
		Self::new("Event Viewer")
	}
}
impl ViewRenderer for HtmlRenderer {
	fn render(&self, view: &ViewResult) -> Result<String> {
		let data = serde_json::to_string(&view.data).map_err(|source| Error::Render { source })?;

		Ok(format!(
			"<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body data-view=\"{view}\">\n<main id=\"app\"></main>\n<script id=\"view-data\" type=\"application/json\">{data}</script>\n</body>\n</html>\n",
			title = escape_html(&self.title),
			view = escape_html(view.view),
			data = escape_script_json(&data),
		))
	}
}

fn escape_html(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for c in raw.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}

	out
}

// `<`, `>` and `&` only occur inside JSON strings, where the `\u` forms are equivalent.
fn escape_script_json(json: &str) -> String {
	json.replace('<', "\\u003c").replace('>', "\\u003e").replace('&', "\\u0026")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rendered_page_embeds_parseable_view_data() {
		let mut data = ViewData::default();

		data.insert("accessToken", "a</script><b>&c");
		data.insert("categoryId", 11881);

		let html = HtmlRenderer::default()
			.render(&ViewResult::new("index", data.clone()))
			.expect("Rendering plain JSON values should succeed.");

		assert!(html.contains("<title>Event Viewer</title>"));
		assert!(html.contains("data-view=\"index\""));
		assert_eq!(html.matches("</script>").count(), 1);

		let start = html.find("application/json\">").expect("Data script should exist.")
			+ "application/json\">".len();
		let end = html.rfind("</script>").expect("Data script should be closed.");
		let embedded: Value =
			serde_json::from_str(&html[start..end]).expect("Embedded data should be valid JSON.");

		assert_eq!(embedded["accessToken"], "a</script><b>&c");
		assert_eq!(embedded["categoryId"], 11881);
	}

	#[test]
	fn titles_are_html_escaped() {
		let html = HtmlRenderer::new("Tom & \"Jerry\"")
			.render(&ViewResult::new("index", ViewData::default()))
			.expect("Rendering an empty view should succeed.");

		assert!(html.contains("<title>Tom &amp; &quot;Jerry&quot;</title>"));
	}
}
