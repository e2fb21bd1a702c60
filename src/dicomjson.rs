//! Helpers for working with DICOM-JSON attribute objects.
//!
//! A DICOM-JSON record is a JSON object keyed by 8-hex-digit tag; each entry
//! holds a value representation code and a `Value` array:
//! <https://dicom.nema.org/medical/dicom/current/output/chtml/part18/sect_F.2.html>

use dicom::core::Tag;
use serde_json::{json, Map, Value};

/// A single study/series/instance record as returned by the upstream server.
pub type DicomJsonObject = Map<String, Value>;

/// Renders a tag as the 8-hex-digit attribute key used by DICOM-JSON.
pub fn tag_key(tag: Tag) -> String {
	format!("{:04X}{:04X}", tag.0, tag.1)
}

/// Builds a DICOM-JSON attribute from a VR code and its values.
pub fn attribute(vr: &str, values: Vec<Value>) -> Value {
	json!({
		"vr": vr,
		"Value": values,
	})
}

pub fn has_tag(record: &DicomJsonObject, tag: Tag) -> bool {
	record.contains_key(&tag_key(tag))
}

/// Injects an attribute unless the upstream already provided the tag.
/// Returns whether the attribute was injected.
pub fn set_if_absent(record: &mut DicomJsonObject, tag: Tag, vr: &str, values: Vec<Value>) -> bool {
	let key = tag_key(tag);
	if record.contains_key(&key) {
		return false;
	}
	record.insert(key, attribute(vr, values));
	true
}

/// Returns the first entry of the attribute's `Value` array, if any.
pub fn first_value<'a>(record: &'a DicomJsonObject, tag: Tag) -> Option<&'a Value> {
	record
		.get(&tag_key(tag))?
		.get("Value")?
		.as_array()?
		.first()
}

/// Returns the first `Value` entry as a string slice, if it is one.
pub fn first_string<'a>(record: &'a DicomJsonObject, tag: Tag) -> Option<&'a str> {
	first_value(record, tag)?.as_str()
}

#[cfg(test)]
mod tests {
	use super::*;
	use dicom::dictionary_std::tags;

	#[test]
	fn tag_keys_are_upper_hex() {
		assert_eq!(tag_key(tags::SOP_CLASS_UID), "00080016");
		assert_eq!(tag_key(tags::SERIES_DESCRIPTION), "0008103E");
		assert_eq!(tag_key(tags::NUMBER_OF_SERIES_RELATED_INSTANCES), "00201209");
		assert_eq!(tag_key(Tag(0x0002, 0x0010)), "00020010");
	}

	#[test]
	fn set_if_absent_injects_missing_attribute() {
		let mut record = DicomJsonObject::new();
		let injected = set_if_absent(
			&mut record,
			tags::MODALITY,
			"CS",
			vec![Value::from("CT")],
		);

		assert!(injected);
		assert_eq!(record["00080060"]["vr"], "CS");
		assert_eq!(record["00080060"]["Value"][0], "CT");
	}

	#[test]
	fn set_if_absent_preserves_upstream_attribute() {
		let mut record = DicomJsonObject::new();
		record.insert(
			tag_key(tags::MODALITY),
			attribute("CS", vec![Value::from("MR")]),
		);

		let injected = set_if_absent(
			&mut record,
			tags::MODALITY,
			"CS",
			vec![Value::from("CT")],
		);

		assert!(!injected);
		assert_eq!(record["00080060"]["Value"][0], "MR");
	}

	#[test]
	fn first_value_handles_numbers_and_strings() {
		let mut record = DicomJsonObject::new();
		record.insert(
			tag_key(tags::SERIES_NUMBER),
			attribute("IS", vec![Value::from(3)]),
		);
		record.insert(
			tag_key(tags::SERIES_INSTANCE_UID),
			attribute("UI", vec![Value::from("1.2.3")]),
		);

		assert_eq!(
			first_value(&record, tags::SERIES_NUMBER).and_then(Value::as_i64),
			Some(3)
		);
		assert_eq!(first_string(&record, tags::SERIES_INSTANCE_UID), Some("1.2.3"));
		assert_eq!(first_value(&record, tags::MODALITY), None);
	}
}
