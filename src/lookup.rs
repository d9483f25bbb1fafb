//! Dotted-path lookup over JSON configuration trees.

// crates.io
use serde_json::Value;

/// Parsed configuration document returned by the config server.
pub type ConfigMap = serde_json::Map<String, Value>;

/// Resolves a dot-separated `path` (for example `"spring.cloud.consul.host"`) against `map`.
///
/// At every level a key equal to the whole remaining path wins, so flattened keys such as
/// `"server.port"` resolve as well as nested objects. Numeric segments index into arrays.
/// Missing segments yield `None`; the lookup never fails.
pub fn lookup<'a>(map: &'a ConfigMap, path: &str) -> Option<&'a Value> {
	if let Some(value) = map.get(path) {
		return Some(value);
	}

	let (head, tail) = path.split_once('.')?;

	walk(map.get(head)?, tail)
}

fn walk<'a>(node: &'a Value, path: &str) -> Option<&'a Value> {
	match node {
		Value::Object(map) => lookup(map, path),
		Value::Array(items) => {
			let (head, tail) = match path.split_once('.') {
				Some((head, tail)) => (head, Some(tail)),
				None => (path, None),
			};
			let item = items.get(head.parse::<usize>().ok()?)?;

			match tail {
				Some(tail) => walk(item, tail),
				None => Some(item),
			}
		},
		_ => None,
	}
}
