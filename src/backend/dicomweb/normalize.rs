//! Injects the minimum tag set the viewer's display-set builder requires into
//! DICOM-JSON records returned by the upstream server.
//!
//! The upstream (Orthanc's DICOMweb plugin) is known to omit tags such as
//! SOP Class UID, Instance Number and the pixel-geometry group on some
//! responses. Injection only fills gaps: attributes provided by the upstream
//! are never removed, renamed or overwritten.

use crate::config::NormalizationConfig;
use crate::dicomjson::{first_value, set_if_absent, DicomJsonObject};
use dicom::dictionary_std::tags;
use serde_json::Value;

/// Ensures an instance record carries the required tag set.
///
/// `position` is the 1-based position of the record in the returned list and
/// is used as the Instance Number fallback.
pub fn normalize_instance(
	record: &mut DicomJsonObject,
	position: usize,
	defaults: &NormalizationConfig,
) {
	set_if_absent(
		record,
		tags::SOP_CLASS_UID,
		"UI",
		vec![Value::from(defaults.sop_class_uid.clone())],
	);

	// Some Orthanc responses carry the SOP Instance UID as a plain top-level
	// field instead of the (0008,0018) attribute.
	if let Some(uid) = record.get("SOPInstanceUID").and_then(Value::as_str) {
		let uid = uid.to_string();
		set_if_absent(record, tags::SOP_INSTANCE_UID, "UI", vec![Value::from(uid)]);
	}

	set_if_absent(
		record,
		tags::INSTANCE_NUMBER,
		"IS",
		vec![Value::from(position)],
	);
	set_if_absent(
		record,
		tags::IMAGE_TYPE,
		"CS",
		defaults.image_type.iter().cloned().map(Value::from).collect(),
	);
	set_if_absent(
		record,
		tags::TRANSFER_SYNTAX_UID,
		"UI",
		vec![Value::from(defaults.transfer_syntax_uid.clone())],
	);
	set_if_absent(
		record,
		tags::PHOTOMETRIC_INTERPRETATION,
		"CS",
		vec![Value::from(defaults.photometric_interpretation.clone())],
	);
	set_if_absent(
		record,
		tags::SAMPLES_PER_PIXEL,
		"US",
		vec![Value::from(defaults.samples_per_pixel)],
	);
	set_if_absent(record, tags::ROWS, "US", vec![Value::from(defaults.rows)]);
	set_if_absent(
		record,
		tags::COLUMNS,
		"US",
		vec![Value::from(defaults.columns)],
	);
	set_if_absent(
		record,
		tags::PIXEL_SPACING,
		"DS",
		defaults
			.pixel_spacing
			.iter()
			.cloned()
			.map(Value::from)
			.collect(),
	);
}

/// Ensures a series record carries the required tag set.
///
/// `instance_count` is the number of instances actually fetched for the
/// series and becomes the Number of Series Related Instances value.
pub fn normalize_series(
	record: &mut DicomJsonObject,
	instance_count: usize,
	defaults: &NormalizationConfig,
) {
	set_if_absent(
		record,
		tags::NUMBER_OF_SERIES_RELATED_INSTANCES,
		"IS",
		vec![Value::from(instance_count)],
	);
	set_if_absent(
		record,
		tags::MODALITY,
		"CS",
		vec![Value::from(defaults.modality.clone())],
	);

	let description = format!("Series {}", series_number_label(record));
	set_if_absent(
		record,
		tags::SERIES_DESCRIPTION,
		"LO",
		vec![Value::from(description)],
	);
}

// Series Number (0020,0011) may be emitted as a JSON number or string; absent
// or malformed values fall back to 1.
fn series_number_label(record: &DicomJsonObject) -> String {
	match first_value(record, tags::SERIES_NUMBER) {
		Some(Value::Number(number)) => number.to_string(),
		Some(Value::String(text)) if !text.is_empty() => text.clone(),
		_ => String::from("1"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dicomjson::{attribute, first_string, has_tag, tag_key};
	use dicom::core::Tag;
	use serde_json::json;

	fn defaults() -> NormalizationConfig {
		NormalizationConfig {
			sop_class_uid: "1.2.840.10008.5.1.4.1.1.2".to_string(),
			transfer_syntax_uid: "1.2.840.10008.1.2.1".to_string(),
			photometric_interpretation: "MONOCHROME2".to_string(),
			modality: "CT".to_string(),
			samples_per_pixel: 1,
			rows: 512,
			columns: 512,
			pixel_spacing: vec!["1.0".to_string(), "1.0".to_string()],
			image_type: vec![
				"ORIGINAL".to_string(),
				"PRIMARY".to_string(),
				"AXIAL".to_string(),
			],
		}
	}

	const REQUIRED_INSTANCE_TAGS: &[&str] = &[
		"00080016", "00200013", "00080008", "00020010", "00280004", "00280002", "00280010",
		"00280011", "00280030",
	];

	#[test]
	fn bare_instance_receives_full_required_tag_set() {
		let mut record = DicomJsonObject::new();
		normalize_instance(&mut record, 1, &defaults());

		for tag in REQUIRED_INSTANCE_TAGS {
			assert!(record.contains_key(*tag), "missing tag {tag}");
		}

		assert_eq!(record["00080016"]["Value"][0], "1.2.840.10008.5.1.4.1.1.2");
		assert_eq!(record["00020010"]["Value"][0], "1.2.840.10008.1.2.1");
		assert_eq!(record["00280004"]["Value"][0], "MONOCHROME2");
		assert_eq!(record["00280010"]["Value"][0], 512);
		assert_eq!(record["00280011"]["Value"][0], 512);
		assert_eq!(record["00280030"]["Value"], json!(["1.0", "1.0"]));
		assert_eq!(
			record["00080008"]["Value"],
			json!(["ORIGINAL", "PRIMARY", "AXIAL"])
		);
	}

	#[test]
	fn upstream_tags_are_never_overwritten() {
		let mut record = DicomJsonObject::new();
		record.insert(
			tag_key(tags::SOP_CLASS_UID),
			// MR Image Storage
			attribute("UI", vec![Value::from("1.2.840.10008.5.1.4.1.1.4")]),
		);
		record.insert(tag_key(tags::ROWS), attribute("US", vec![Value::from(64)]));
		record.insert(
			tag_key(tags::INSTANCE_NUMBER),
			attribute("IS", vec![Value::from(17)]),
		);

		normalize_instance(&mut record, 3, &defaults());

		assert_eq!(record["00080016"]["Value"][0], "1.2.840.10008.5.1.4.1.1.4");
		assert_eq!(record["00280010"]["Value"][0], 64);
		assert_eq!(record["00200013"]["Value"][0], 17);
		// Gaps are still filled
		assert_eq!(record["00280011"]["Value"][0], 512);
	}

	#[test]
	fn instance_number_defaults_to_list_position() {
		let mut first = DicomJsonObject::new();
		let mut second = DicomJsonObject::new();
		normalize_instance(&mut first, 1, &defaults());
		normalize_instance(&mut second, 2, &defaults());

		assert_eq!(first["00200013"]["Value"][0], 1);
		assert_eq!(second["00200013"]["Value"][0], 2);
	}

	#[test]
	fn sop_instance_uid_copied_from_plain_field() {
		let mut record = DicomJsonObject::new();
		record.insert("SOPInstanceUID".to_string(), Value::from("4.5.6.7"));

		normalize_instance(&mut record, 1, &defaults());

		assert_eq!(first_string(&record, tags::SOP_INSTANCE_UID), Some("4.5.6.7"));
		// The plain field is upstream data and stays untouched
		assert_eq!(record["SOPInstanceUID"], "4.5.6.7");
	}

	#[test]
	fn sop_instance_uid_attribute_wins_over_plain_field() {
		let mut record = DicomJsonObject::new();
		record.insert("SOPInstanceUID".to_string(), Value::from("4.5.6.7"));
		record.insert(
			tag_key(tags::SOP_INSTANCE_UID),
			attribute("UI", vec![Value::from("1.1.1.1")]),
		);

		normalize_instance(&mut record, 1, &defaults());

		assert_eq!(first_string(&record, tags::SOP_INSTANCE_UID), Some("1.1.1.1"));
	}

	#[test]
	fn bare_series_receives_defaults() {
		let mut record = DicomJsonObject::new();
		normalize_series(&mut record, 42, &defaults());

		assert_eq!(record["00201209"]["Value"][0], 42);
		assert_eq!(record["00080060"]["Value"][0], "CT");
		assert_eq!(record["0008103E"]["Value"][0], "Series 1");
	}

	#[test]
	fn series_description_uses_series_number() {
		let mut record = DicomJsonObject::new();
		record.insert(
			tag_key(tags::SERIES_NUMBER),
			attribute("IS", vec![Value::from(5)]),
		);

		normalize_series(&mut record, 0, &defaults());

		assert_eq!(record["0008103E"]["Value"][0], "Series 5");
	}

	#[test]
	fn series_modality_from_upstream_is_kept() {
		let mut record = DicomJsonObject::new();
		record.insert(
			tag_key(tags::MODALITY),
			attribute("CS", vec![Value::from("US")]),
		);

		normalize_series(&mut record, 1, &defaults());

		assert_eq!(record["00080060"]["Value"][0], "US");
		assert!(has_tag(&record, Tag(0x0020, 0x1209)));
	}
}
