//! Flat position payload codec.
//!
//! The wire shape is a flat object with `lat` and `lng` number
//! fields. Decoding is strict: both fields must be present, numeric,
//! and finite. Unknown extra fields are ignored.

use serde_json::{Value, json};

use transitline_errors::TrackingError;
use transitline_geo::Position;

/// Encode a position as the flat wire payload.
#[must_use]
pub fn encode_position(position: &Position) -> Value {
    json!({
        "lat": position.latitude,
        "lng": position.longitude,
    })
}

/// Decode the flat wire payload into a position.
pub fn decode_position(payload: &Value) -> Result<Position, TrackingError> {
    let latitude = numeric_field(payload, "lat")?;
    let longitude = numeric_field(payload, "lng")?;
    Ok(Position::new(latitude, longitude))
}

fn numeric_field(payload: &Value, field: &str) -> Result<f64, TrackingError> {
    let value = payload
        .get(field)
        .ok_or_else(|| TrackingError::invalid_data(format!("missing field `{field}`")))?;
    let number = value.as_f64().ok_or_else(|| {
        TrackingError::invalid_data(format!("field `{field}` is not a number: {value}"))
    })?;
    if !number.is_finite() {
        return Err(TrackingError::invalid_data(format!(
            "field `{field}` is not finite"
        )));
    }
    Ok(number)
}
