//! URL template resolution for configuration endpoints.
//!
//! A template is a plain string with the placeholders `{address}`, `{branch}`,
//! `{profile}`, and `{app_name}`. Resolution substitutes each placeholder in a single
//! left-to-right pass (substituted values are never rescanned) and then normalizes the
//! extension of the final path segment so the request always targets the JSON view.
//! Unknown placeholders and malformed templates pass through literally.

// self
use crate::_prelude::*;

/// Template used when callers do not override the configuration URL.
pub const DEFAULT_URL_TEMPLATE: &str = "{address}/{branch}/{profile}-{app_name}.json";

const JSON_EXTENSION: &str = "json";
const CONVERTIBLE_EXTENSIONS: [&str; 3] = ["yaml", "yml", "properties"];

/// Identity values substituted into a [`UrlTemplate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity<'a> {
	/// Config server base URL.
	pub address: &'a str,
	/// Repository branch or label.
	pub branch: &'a str,
	/// Active profile.
	pub profile: &'a str,
	/// Application name.
	pub app_name: &'a str,
}
impl<'a> Identity<'a> {
	fn placeholder(&self, name: &str) -> Option<&'a str> {
		match name {
			"address" => Some(self.address),
			"branch" => Some(self.branch),
			"profile" => Some(self.profile),
			"app_name" => Some(self.app_name),
			_ => None,
		}
	}
}

/// Configuration URL template.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);
impl UrlTemplate {
	/// Wraps a template string.
	pub fn new(template: impl Into<String>) -> Self {
		Self(template.into())
	}

	/// Returns the raw template.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Resolves the template for `identity`.
	pub fn resolve(&self, identity: &Identity) -> String {
		normalize_extension(substitute(&self.0, identity))
	}
}
impl Default for UrlTemplate {
	fn default() -> Self {
		Self::new(DEFAULT_URL_TEMPLATE)
	}
}
impl Display for UrlTemplate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl From<&str> for UrlTemplate {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for UrlTemplate {
	fn from(value: String) -> Self {
		Self(value)
	}
}

fn substitute(template: &str, identity: &Identity) -> String {
	let mut out = String::with_capacity(template.len() + 64);
	let mut rest = template;

	while let Some(start) = rest.find('{') {
		out.push_str(&rest[..start]);

		let tail = &rest[start..];
		let resolved = tail
			.find('}')
			.and_then(|end| identity.placeholder(&tail[1..end]).map(|value| (end, value)));

		match resolved {
			Some((end, value)) => {
				out.push_str(value);

				rest = &tail[end + 1..];
			},
			None => {
				out.push('{');

				rest = &tail[1..];
			},
		}
	}

	out.push_str(rest);

	out
}

fn normalize_extension(url: String) -> String {
	let path_end = url.find(['?', '#']).unwrap_or(url.len());
	let (path, suffix) = url.split_at(path_end);
	let segment_start = path.rfind('/').map_or(0, |idx| idx + 1);
	let segment = &path[segment_start..];

	if segment.is_empty() {
		return url;
	}

	let rewritten = match segment.rsplit_once('.') {
		Some((_, ext)) if ext.eq_ignore_ascii_case(JSON_EXTENSION) => None,
		Some((stem, ext))
			if CONVERTIBLE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)) =>
			Some(format!("{}{stem}.{JSON_EXTENSION}{suffix}", &path[..segment_start])),
		_ => Some(format!("{path}.{JSON_EXTENSION}{suffix}")),
	};

	rewritten.unwrap_or(url)
}
