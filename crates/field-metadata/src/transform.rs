//! Normalizes extracted metadata into the keys component initializers understand

use crate::annotation::keys;
use crate::property::PropertyInformation;
use render_hooks::{CommonMetadataKey, MetadataMap};
use serde_json::Value;

/// Convert the constraint annotations of a property into a [`MetadataMap`].
///
/// Several `Size` entries combine into the tightest bounds. The first
/// `Pattern` entry wins.
pub fn common_metadata(info: &PropertyInformation) -> MetadataMap {
    let mut map = MetadataMap::new();
    let mut min_length: Option<u64> = None;
    let mut max_length: Option<u64> = None;

    for entry in info.entries() {
        let annotation = &entry.value;
        match entry.key.as_str() {
            keys::NOT_NULL => {
                map.insert(CommonMetadataKey::Required.to_string(), Value::Bool(true));
            }
            keys::SIZE => {
                if let Some(min) = annotation.u64_attribute("min").filter(|min| *min > 0) {
                    min_length = Some(min_length.map_or(min, |m| m.max(min)));
                }
                if let Some(max) = annotation.u64_attribute("max") {
                    max_length = Some(max_length.map_or(max, |m| m.min(max)));
                }
            }
            keys::PATTERN => {
                if let Some(regexp) = annotation.str_attribute("regexp") {
                    map.entry(CommonMetadataKey::Pattern.to_string())
                        .or_insert_with(|| Value::String(regexp.to_string()));
                }
            }
            _ => {}
        }
    }

    if let Some(min) = min_length {
        map.insert(CommonMetadataKey::MinLength.to_string(), Value::from(min));
    }
    if let Some(max) = max_length {
        map.insert(CommonMetadataKey::MaxLength.to_string(), Value::from(max));
    }
    map
}
