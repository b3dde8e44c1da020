/*!
This crate evaluates a dataframe to see whether its memory usage can be reduced while still preserving the data it holds. It proposes narrower widths for integer columns whose observed range fits them, a caller-chosen lower precision for float columns, and dictionary encoding for string columns with few distinct values, then materializes a new dataframe with those proposals applied.
*/

use slimframe_dataframe::{Column, DataFrame, FloatWidth};
use slimframe_util::progress_counter::ProgressCounter;
use std::collections::BTreeMap;
use thiserror::Error;

mod cast;
mod narrow;

pub use self::cast::{MemoryComparison, ShrinkOutput};

/// This struct contains settings used to check a dataframe for memory improvements.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckerSettings {
	/// The maximum number of distinct values in a string column to propose dictionary encoding it.
	pub categorical_threshold: usize,
	/// The desired float width in bits, one of 16, 32, or 64. 64 is the default width of float columns, so it disables float narrowing.
	pub target_float_width: u8,
}

impl Default for CheckerSettings {
	fn default() -> Self {
		Self {
			categorical_threshold: 15,
			target_float_width: 16,
		}
	}
}

#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("target_float_width must be one of 16, 32, or 64, got {0}")]
	InvalidFloatWidth(u8),
	#[error("categorical_threshold must be a positive integer")]
	InvalidCategoricalThreshold,
}

#[derive(Debug, Error)]
pub enum ShrinkError {
	#[error("the dataframe has not been analyzed for improvements yet")]
	NotAnalyzed,
	#[error("no possible improvements were found for this dataframe")]
	NoImprovementsFound,
}

/// The column kinds the checker knows how to narrow. Boolean, enum, and unknown columns are never narrowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColumnKind {
	Float,
	Int,
	Text,
}

/// The lower memory types a column can be cast to. The widest integer and float widths never appear here because casting to them would be a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NarrowColumnType {
	Int8,
	Int16,
	Int32,
	Float16,
	Float32,
	Enum,
}

#[derive(Debug)]
pub enum CheckProgress {
	FloatColumns(ProgressCounter),
	IntColumns(ProgressCounter),
	TextColumns(ProgressCounter),
}

#[derive(Debug)]
enum AnalysisState {
	Unanalyzed,
	NoImprovementsFound,
	ImprovementsFound(BTreeMap<String, NarrowColumnType>),
}

/// This struct checks a dataframe for columns that could be stored in a lower memory representation. Construct it over a dataframe, call [`identify_improvements`](MemoryChecker::identify_improvements), then call [`shrink`](MemoryChecker::shrink) to materialize a new dataframe with every proposal applied. The checker never mutates the dataframe it borrows, and it does not watch for mutations: if the caller changes the dataframe between calls, previously accumulated proposals can go stale.
pub struct MemoryChecker<'a> {
	dataframe: &'a DataFrame,
	categorical_threshold: usize,
	target_float_width: FloatWidth,
	columns_by_kind: BTreeMap<ColumnKind, Vec<String>>,
	state: AnalysisState,
}

impl<'a> MemoryChecker<'a> {
	pub fn new(
		dataframe: &'a DataFrame,
		settings: CheckerSettings,
	) -> Result<Self, SettingsError> {
		let target_float_width = match settings.target_float_width {
			16 => FloatWidth::W16,
			32 => FloatWidth::W32,
			64 => FloatWidth::W64,
			width => return Err(SettingsError::InvalidFloatWidth(width)),
		};
		if settings.categorical_threshold == 0 {
			return Err(SettingsError::InvalidCategoricalThreshold);
		}
		let columns_by_kind = columns_by_kind(dataframe);
		Ok(Self {
			dataframe,
			categorical_threshold: settings.categorical_threshold,
			target_float_width,
			columns_by_kind,
			state: AnalysisState::Unanalyzed,
		})
	}

	/// Return the checked columns grouped by kind. Kinds with no matching columns are absent.
	pub fn columns_by_kind(&self) -> &BTreeMap<ColumnKind, Vec<String>> {
		&self.columns_by_kind
	}

	/// Run all three analyzers and merge their proposals into the accumulated mapping. Re-running merges fresh results without clearing prior ones.
	pub fn identify_improvements(&mut self, update_progress: &mut impl FnMut(CheckProgress)) {
		let mut improvements = BTreeMap::new();
		improvements.extend(narrow::float_improvements(
			self.dataframe,
			self.columns_of_kind(ColumnKind::Float),
			self.target_float_width,
			update_progress,
		));
		improvements.extend(narrow::int_improvements(
			self.dataframe,
			self.columns_of_kind(ColumnKind::Int),
			update_progress,
		));
		improvements.extend(narrow::enum_improvements(
			self.dataframe,
			self.columns_of_kind(ColumnKind::Text),
			self.categorical_threshold,
			update_progress,
		));
		self.state = match std::mem::replace(&mut self.state, AnalysisState::Unanalyzed) {
			AnalysisState::ImprovementsFound(mut existing) => {
				existing.extend(improvements);
				AnalysisState::ImprovementsFound(existing)
			}
			AnalysisState::Unanalyzed | AnalysisState::NoImprovementsFound => {
				if improvements.is_empty() {
					AnalysisState::NoImprovementsFound
				} else {
					AnalysisState::ImprovementsFound(improvements)
				}
			}
		};
	}

	/// Return the accumulated proposals. The mapping is empty if the dataframe has not been analyzed yet.
	pub fn possible_improvements(&self) -> BTreeMap<String, NarrowColumnType> {
		match &self.state {
			AnalysisState::ImprovementsFound(improvements) => improvements.clone(),
			_ => BTreeMap::new(),
		}
	}

	/// Materialize a new dataframe with every proposal applied. Columns without a proposal are passed through unchanged.
	pub fn shrink(&self) -> Result<ShrinkOutput, ShrinkError> {
		let improvements = match &self.state {
			AnalysisState::Unanalyzed => return Err(ShrinkError::NotAnalyzed),
			AnalysisState::NoImprovementsFound => return Err(ShrinkError::NoImprovementsFound),
			AnalysisState::ImprovementsFound(improvements) => improvements,
		};
		Ok(cast::shrink_dataframe(self.dataframe, improvements))
	}

	fn columns_of_kind(&self, kind: ColumnKind) -> &[String] {
		self.columns_by_kind
			.get(&kind)
			.map(|columns| columns.as_slice())
			.unwrap_or(&[])
	}
}

fn columns_by_kind(dataframe: &DataFrame) -> BTreeMap<ColumnKind, Vec<String>> {
	let mut columns_by_kind: BTreeMap<ColumnKind, Vec<String>> = BTreeMap::new();
	for column in dataframe.columns.iter() {
		let kind = match column {
			Column::Float(_) => Some(ColumnKind::Float),
			Column::Int(_) => Some(ColumnKind::Int),
			Column::Text(_) => Some(ColumnKind::Text),
			Column::Unknown(_) | Column::Boolean(_) | Column::Enum(_) => None,
		};
		if let Some(kind) = kind {
			columns_by_kind
				.entry(kind)
				.or_insert_with(Vec::new)
				.push(column.name().to_owned());
		}
	}
	columns_by_kind
}

#[cfg(test)]
use slimframe_dataframe::{
	BooleanColumn, FloatColumnData, IntColumn, IntColumnData, FloatColumn, TextColumn,
};

#[cfg(test)]
fn test_dataframe() -> DataFrame {
	DataFrame {
		columns: vec![
			Column::Int(IntColumn {
				name: "a".to_owned(),
				data: IntColumnData::I64(vec![-128, -100, -50, -25, 0, 25, 50, 100, 120, 127]),
			}),
			Column::Text(TextColumn {
				name: "b".to_owned(),
				data: vec!["x", "y", "x", "y", "x", "y", "x", "y", "x", "y"]
					.into_iter()
					.map(|value| value.to_owned())
					.collect(),
			}),
			Column::Float(FloatColumn {
				name: "c".to_owned(),
				data: FloatColumnData::F64(vec![
					-0.5, -0.4, -0.3, -0.2, -0.1, 0.1, 0.2, 0.3, 0.4, 0.5,
				]),
			}),
			Column::Boolean(BooleanColumn {
				name: "d".to_owned(),
				data: vec![true; 10],
			}),
		],
	}
}

#[test]
fn test_classify_columns() {
	let dataframe = test_dataframe();
	let checker = MemoryChecker::new(&dataframe, CheckerSettings::default()).unwrap();
	let columns_by_kind = checker.columns_by_kind();
	assert_eq!(columns_by_kind[&ColumnKind::Int], vec!["a".to_owned()]);
	assert_eq!(columns_by_kind[&ColumnKind::Text], vec!["b".to_owned()]);
	assert_eq!(columns_by_kind[&ColumnKind::Float], vec!["c".to_owned()]);
	// Boolean columns are not tracked, so only three kinds can ever appear.
	assert_eq!(columns_by_kind.len(), 3);
	let dataframe = DataFrame {
		columns: vec![Column::Boolean(BooleanColumn {
			name: "d".to_owned(),
			data: vec![true, false],
		})],
	};
	let checker = MemoryChecker::new(&dataframe, CheckerSettings::default()).unwrap();
	assert!(checker.columns_by_kind().is_empty());
}

#[test]
fn test_identify_improvements() {
	let dataframe = test_dataframe();
	let mut checker = MemoryChecker::new(&dataframe, CheckerSettings::default()).unwrap();
	checker.identify_improvements(&mut |_| {});
	insta::assert_debug_snapshot!(checker.possible_improvements(), @r###"
 {
     "a": Int8,
     "b": Enum,
     "c": Float16,
 }
 "###);
}

#[test]
fn test_integer_width_selection() {
	let dataframe = DataFrame {
		columns: vec![
			Column::Int(IntColumn {
				name: "small".to_owned(),
				data: IntColumnData::I64(vec![0, 100]),
			}),
			Column::Int(IntColumn {
				name: "medium".to_owned(),
				data: IntColumnData::I64(vec![-32768, 32767]),
			}),
			Column::Int(IntColumn {
				name: "large".to_owned(),
				data: IntColumnData::I64(vec![0, 40_000]),
			}),
			Column::Int(IntColumn {
				name: "huge".to_owned(),
				data: IntColumnData::I64(vec![0, 3_000_000_000]),
			}),
		],
	};
	let mut checker = MemoryChecker::new(&dataframe, CheckerSettings::default()).unwrap();
	checker.identify_improvements(&mut |_| {});
	let improvements = checker.possible_improvements();
	assert_eq!(improvements.get("small"), Some(&NarrowColumnType::Int8));
	assert_eq!(improvements.get("medium"), Some(&NarrowColumnType::Int16));
	assert_eq!(improvements.get("large"), Some(&NarrowColumnType::Int32));
	assert_eq!(improvements.get("huge"), None);
}

#[test]
fn test_integer_already_narrow() {
	let dataframe = DataFrame {
		columns: vec![
			Column::Int(IntColumn {
				name: "bytes".to_owned(),
				data: IntColumnData::I8(vec![1, 2]),
			}),
			Column::Int(IntColumn {
				name: "words".to_owned(),
				data: IntColumnData::I32(vec![0, 100]),
			}),
		],
	};
	let mut checker = MemoryChecker::new(&dataframe, CheckerSettings::default()).unwrap();
	checker.identify_improvements(&mut |_| {});
	let improvements = checker.possible_improvements();
	assert_eq!(improvements.get("bytes"), None);
	assert_eq!(improvements.get("words"), Some(&NarrowColumnType::Int8));
}

#[test]
fn test_float_width_policy() {
	let dataframe = DataFrame {
		columns: vec![
			Column::Float(FloatColumn {
				name: "wide".to_owned(),
				data: FloatColumnData::F64(vec![0.25, 1e300]),
			}),
			Column::Float(FloatColumn {
				name: "narrow".to_owned(),
				data: FloatColumnData::F32(vec![0.25, 0.5]),
			}),
		],
	};
	// 64 disables float narrowing entirely.
	let mut checker = MemoryChecker::new(
		&dataframe,
		CheckerSettings {
			target_float_width: 64,
			..Default::default()
		},
	)
	.unwrap();
	checker.identify_improvements(&mut |_| {});
	assert!(checker.possible_improvements().is_empty());
	// Any other width is proposed for every wider float column, with no inspection of the values.
	let mut checker = MemoryChecker::new(
		&dataframe,
		CheckerSettings {
			target_float_width: 32,
			..Default::default()
		},
	)
	.unwrap();
	checker.identify_improvements(&mut |_| {});
	let improvements = checker.possible_improvements();
	assert_eq!(improvements.get("wide"), Some(&NarrowColumnType::Float32));
	assert_eq!(improvements.get("narrow"), None);
}

#[test]
fn test_categorical_threshold() {
	let labels: Vec<String> = (0..10).map(|index| format!("label_{}", index)).collect();
	let dataframe = DataFrame {
		columns: vec![Column::Text(TextColumn {
			name: "labels".to_owned(),
			data: labels,
		})],
	};
	// Ten distinct values over a threshold of five is not worth a dictionary.
	let mut checker = MemoryChecker::new(
		&dataframe,
		CheckerSettings {
			categorical_threshold: 5,
			..Default::default()
		},
	)
	.unwrap();
	checker.identify_improvements(&mut |_| {});
	assert_eq!(checker.possible_improvements().get("labels"), None);
	// The comparison is inclusive, so a threshold of exactly ten qualifies.
	let mut checker = MemoryChecker::new(
		&dataframe,
		CheckerSettings {
			categorical_threshold: 10,
			..Default::default()
		},
	)
	.unwrap();
	checker.identify_improvements(&mut |_| {});
	assert_eq!(
		checker.possible_improvements().get("labels"),
		Some(&NarrowColumnType::Enum)
	);
	// One below the distinct count does not.
	let mut checker = MemoryChecker::new(
		&dataframe,
		CheckerSettings {
			categorical_threshold: 9,
			..Default::default()
		},
	)
	.unwrap();
	checker.identify_improvements(&mut |_| {});
	assert_eq!(checker.possible_improvements().get("labels"), None);
}

#[test]
fn test_shrink_before_analysis() {
	let dataframe = test_dataframe();
	let checker = MemoryChecker::new(&dataframe, CheckerSettings::default()).unwrap();
	assert!(matches!(checker.shrink(), Err(ShrinkError::NotAnalyzed)));
	assert!(checker.possible_improvements().is_empty());
}

#[test]
fn test_shrink_without_improvements() {
	let dataframe = DataFrame {
		columns: vec![Column::Boolean(BooleanColumn {
			name: "d".to_owned(),
			data: vec![true, false],
		})],
	};
	let mut checker = MemoryChecker::new(&dataframe, CheckerSettings::default()).unwrap();
	checker.identify_improvements(&mut |_| {});
	assert!(checker.possible_improvements().is_empty());
	assert!(matches!(
		checker.shrink(),
		Err(ShrinkError::NoImprovementsFound)
	));
}

#[test]
fn test_invalid_settings() {
	let dataframe = test_dataframe();
	let result = MemoryChecker::new(
		&dataframe,
		CheckerSettings {
			target_float_width: 99,
			..Default::default()
		},
	);
	assert!(matches!(result, Err(SettingsError::InvalidFloatWidth(99))));
	let result = MemoryChecker::new(
		&dataframe,
		CheckerSettings {
			categorical_threshold: 0,
			..Default::default()
		},
	);
	assert!(matches!(
		result,
		Err(SettingsError::InvalidCategoricalThreshold)
	));
}

#[test]
fn test_reanalyze_merges() {
	let dataframe = test_dataframe();
	let mut checker = MemoryChecker::new(&dataframe, CheckerSettings::default()).unwrap();
	checker.identify_improvements(&mut |_| {});
	let first = checker.possible_improvements();
	checker.identify_improvements(&mut |_| {});
	assert_eq!(first, checker.possible_improvements());
}

#[test]
fn test_progress_events() {
	let dataframe = test_dataframe();
	let mut checker = MemoryChecker::new(&dataframe, CheckerSettings::default()).unwrap();
	let mut events = Vec::new();
	checker.identify_improvements(&mut |progress| events.push(progress));
	// One event per analyzer, in the order they run.
	assert!(matches!(events[0], CheckProgress::FloatColumns(_)));
	assert!(matches!(events[1], CheckProgress::IntColumns(_)));
	assert!(matches!(events[2], CheckProgress::TextColumns(_)));
	if let CheckProgress::IntColumns(counter) = &events[1] {
		assert_eq!(counter.total(), 10);
		assert_eq!(counter.get(), 10);
	}
}
