use std::fmt::{Display, Formatter};

/// UI (Unique Identifier) value representation.
pub type UI = String;

/// The record level of a DICOM-JSON object within the study/series/instance hierarchy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RecordLevel {
	Study,
	Series,
	Instance,
}

impl Display for RecordLevel {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Study => write!(f, "STUDY"),
			Self::Series => write!(f, "SERIES"),
			Self::Instance => write!(f, "INSTANCE"),
		}
	}
}
