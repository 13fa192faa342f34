//! Location payloads in their three upstream shapes.

// crates.io
use serde_json::Map;
// self
use super::malformed;
use crate::{_prelude::*, model::Location};

/// Timestamp keys consulted on history entries, most authoritative first.
pub const TIMESTAMP_FIELDS: [&str; 3] = ["eventTimestamp", "gpsFixTimestamp", "timestamp"];

const CONTEXT: &str = "location";
const NESTED_FIELDS: [&str; 2] = ["lastKnownLocation", "location"];

/// Shapes a location payload may take, in the order they are tried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
	/// `{"values": [{"point": {"lat", "lon"}, "eventTimestamp"}, ...]}` or a bare array.
	History,
	/// `{"geometry": {"coordinates": [lon, lat]}, "timestamp"}`.
	GeoJson,
	/// `{"latitude", "longitude"}`, possibly nested under `lastKnownLocation` or `location`.
	Flat,
}
const SHAPE_PRIORITY: [Shape; 3] = [Shape::History, Shape::GeoJson, Shape::Flat];

/// Resolves the best available position from any supported location payload.
///
/// History payloads yield the entry with the greatest timestamp among those that carry
/// coordinates; entries without a timestamp rank oldest and ties keep the earliest entry.
/// Returns `Ok(None)` when the payload holds no position at all.
pub fn normalize_location(payload: &Value) -> Result<Option<Location>> {
	match payload {
		Value::Null => Ok(None),
		Value::Array(items) => from_history(items, ""),
		Value::Object(object) => from_object(object, ""),
		_ => Err(malformed(CONTEXT, ".", "expected an object or a sequence")),
	}
}

fn from_object(object: &Map<String, Value>, path: &str) -> Result<Option<Location>> {
	for shape in SHAPE_PRIORITY {
		let found = match shape {
			Shape::History => match object.get("values") {
				None | Some(Value::Null) => None,
				Some(Value::Array(items)) => from_history(items, &join(path, "values"))?,
				Some(_) =>
					return Err(malformed(CONTEXT, join(path, "values"), "expected a sequence")),
			},
			Shape::GeoJson => from_geojson(object, path)?,
			Shape::Flat => from_flat(object, path)?,
		};

		if found.is_some() {
			return Ok(found);
		}
	}

	Ok(None)
}

fn from_history(items: &[Value], path: &str) -> Result<Option<Location>> {
	let mut best: Option<Location> = None;

	for (index, item) in items.iter().enumerate() {
		let entry_path = format!("{path}[{index}]");
		let Value::Object(entry) = item else {
			return Err(malformed(CONTEXT, entry_path, "expected an object"));
		};
		let Some(candidate) = history_entry(entry, &entry_path)? else {
			continue;
		};
		let newer = match &best {
			None => true,
			Some(current) => candidate.timestamp > current.timestamp,
		};

		if newer {
			best = Some(candidate);
		}
	}

	Ok(best)
}

fn history_entry(entry: &Map<String, Value>, path: &str) -> Result<Option<Location>> {
	let timestamp = best_timestamp(entry);
	let position = match entry.get("point") {
		Some(Value::Object(point)) => {
			let point_path = join(path, "point");

			pair(
				coordinate(point.get("lat"), &join(&point_path, "lat"))?,
				coordinate(point.get("lon"), &join(&point_path, "lon"))?,
			)
		},
		None | Some(Value::Null) => match from_geojson(entry, path)? {
			Some(location) => Some((location.latitude, location.longitude)),
			None => from_flat(entry, path)?.map(|location| (location.latitude, location.longitude)),
		},
		Some(_) => return Err(malformed(CONTEXT, join(path, "point"), "expected an object")),
	};

	Ok(position.map(|(latitude, longitude)| Location { latitude, longitude, timestamp }))
}

fn from_geojson(object: &Map<String, Value>, path: &str) -> Result<Option<Location>> {
	let geometry_path = join(path, "geometry");
	let geometry = match object.get("geometry") {
		None | Some(Value::Null) => return Ok(None),
		Some(Value::Object(geometry)) => geometry,
		Some(_) => return Err(malformed(CONTEXT, geometry_path, "expected an object")),
	};
	let coordinates_path = join(&geometry_path, "coordinates");
	let coordinates = match geometry.get("coordinates") {
		None | Some(Value::Null) => return Ok(None),
		Some(Value::Array(coordinates)) => coordinates,
		Some(_) => return Err(malformed(CONTEXT, coordinates_path, "expected a sequence")),
	};
	let [longitude, latitude, ..] = coordinates.as_slice() else {
		return Err(malformed(
			CONTEXT,
			coordinates_path,
			"expected a [longitude, latitude] pair",
		));
	};
	let (Some(longitude), Some(latitude)) = (longitude.as_f64(), latitude.as_f64()) else {
		return Err(malformed(CONTEXT, coordinates_path, "coordinates must be numbers"));
	};

	Ok(Some(Location { latitude, longitude, timestamp: best_timestamp(object) }))
}

fn from_flat(object: &Map<String, Value>, path: &str) -> Result<Option<Location>> {
	let position = pair(
		coordinate(object.get("latitude"), &join(path, "latitude"))?,
		coordinate(object.get("longitude"), &join(path, "longitude"))?,
	);

	if let Some((latitude, longitude)) = position {
		return Ok(Some(Location { latitude, longitude, timestamp: best_timestamp(object) }));
	}

	for field in NESTED_FIELDS {
		let nested_path = join(path, field);

		match object.get(field) {
			None | Some(Value::Null) => continue,
			Some(Value::Object(nested)) =>
				if let Some(location) = from_object(nested, &nested_path)? {
					return Ok(Some(location));
				},
			Some(_) => return Err(malformed(CONTEXT, nested_path, "expected an object")),
		}
	}

	Ok(None)
}

fn coordinate(value: Option<&Value>, path: &str) -> Result<Option<f64>> {
	match value {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Number(number)) => number
			.as_f64()
			.filter(|value| value.is_finite())
			.map(Some)
			.ok_or_else(|| malformed(CONTEXT, path, "coordinate is out of range")),
		Some(Value::String(text)) => text
			.trim()
			.parse::<f64>()
			.ok()
			.filter(|value| value.is_finite())
			.map(Some)
			.ok_or_else(|| malformed(CONTEXT, path, "coordinate must be numeric")),
		Some(_) => Err(malformed(CONTEXT, path, "coordinate must be numeric")),
	}
}

fn pair(latitude: Option<f64>, longitude: Option<f64>) -> Option<(f64, f64)> {
	Some((latitude?, longitude?))
}

fn best_timestamp(object: &Map<String, Value>) -> Option<String> {
	TIMESTAMP_FIELDS.iter().find_map(|field| match object.get(*field) {
		Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
		Some(Value::Number(number)) => Some(number.to_string()),
		_ => None,
	})
}

fn join(path: &str, field: &str) -> String {
	if path.is_empty() { field.to_owned() } else { format!("{path}.{field}") }
}
