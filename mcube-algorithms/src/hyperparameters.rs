use anyhow::{anyhow, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Overlays user supplied hyperparameters on `defaults`. Unknown keys and ill-typed values
/// are rejected when the strategy's config denies unknown fields.
pub(crate) fn initialize<T>(defaults: T, hyperparameters: &Option<Map<String, Value>>) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged_params = serde_json::to_value(defaults)?;
    if let (Value::Object(ref mut obj), Some(map)) = (&mut merged_params, hyperparameters) {
        for (k, v) in map {
            obj.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(merged_params).map_err(|e| anyhow!("Invalid hyperparameters: {}", e))
}
