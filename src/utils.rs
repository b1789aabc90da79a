// System libraries.
use std::time::{SystemTime, UNIX_EPOCH};

// Third party libraries.
use log::warn;
use serde_json::Value;

// Project libraries.
use crate::error::CacheError;
use crate::events::PRICE_UPDATED;
use crate::types::PriceUpdate;

pub fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64)
}

/// Parse one price payload. The backend sends `null` for a side without orders, but `type_id` and `updated_at` must
/// be present.
pub fn parse_price_update(payload: &Value) -> Result<PriceUpdate, CacheError> {
    let malformed = |message: String| CacheError::MalformedEvent {
        event: PRICE_UPDATED.to_string(),
        message,
    };

    let obj = payload
        .as_object()
        .ok_or_else(|| malformed("payload is not an object".to_string()))?;

    // Check if BOTH type_id and updated_at exist and are not null.
    let is_valid = obj.get("type_id").is_some_and(|v| !v.is_null())
        && obj.get("updated_at").is_some_and(|v| !v.is_null());
    if !is_valid {
        return Err(malformed("missing or null type_id/updated_at".to_string()));
    }

    let update: PriceUpdate =
        serde_json::from_value(payload.clone()).map_err(|e| malformed(e.to_string()))?;
    let finite = |side: Option<f64>| side.is_none_or(f64::is_finite);
    if !finite(update.sell_min) || !finite(update.buy_max) {
        return Err(malformed(format!("non-finite price for {}", update.type_id)));
    }
    Ok(update)
}

/// Parse a batch payload, skipping entries that do not make sense instead of dropping the whole batch.
pub fn parse_price_updates(arr: &[Value]) -> Vec<PriceUpdate> {
    let mut result = Vec::new();
    for (i, item) in arr.iter().enumerate() {
        match parse_price_update(item) {
            Ok(update) => result.push(update),
            Err(e) => warn!("Skipping price entry {i}: {e}"),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_price_update() {
        let update = parse_price_update(&json!({
            "type_id": 34,
            "sell_min": 5.25,
            "buy_max": 4.75,
            "updated_at": 1700000000
        }))
        .unwrap();
        assert_eq!(update.type_id, 34);
        assert_eq!(update.sell_min, Some(5.25));
        assert_eq!(update.buy_max, Some(4.75));
        assert_eq!(update.updated_at, 1700000000);
    }

    #[test]
    fn test_parse_price_update_rejects_missing_fields() {
        assert!(parse_price_update(&json!({ "type_id": 34, "updated_at": null })).is_err());
        assert!(parse_price_update(&json!({ "updated_at": 1 })).is_err());
        assert!(parse_price_update(&json!([1, 2])).is_err());
        assert!(parse_price_update(&json!({ "type_id": "x", "updated_at": 1 })).is_err());
    }

    #[test]
    fn test_parse_price_update_null_sides() {
        let update = parse_price_update(&json!({ "type_id": 34, "updated_at": 9 })).unwrap();
        assert_eq!(update.sell_min, None);
        assert_eq!(update.buy_max, None);
    }

    #[test]
    fn test_parse_price_updates_skips_invalid() {
        let arr = vec![
            json!({ "type_id": 1, "sell_min": 1.0, "buy_max": null, "updated_at": 5 }),
            json!("garbage"),
            json!({ "type_id": 3, "updated_at": null }),
            json!({ "type_id": 4, "sell_min": null, "buy_max": 2.0, "updated_at": 6 }),
        ];
        let updates = parse_price_updates(&arr);
        let ids: Vec<i64> = updates.iter().map(|u| u.type_id).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
