use super::{CheckProgress, NarrowColumnType};
use num_traits::ToPrimitive;
use slimframe_dataframe::{DataFrame, FloatWidth, IntWidth};
use slimframe_util::progress_counter::ProgressCounter;
use std::collections::BTreeMap;

/// The signed ranges of the candidate integer widths, tested narrowest first.
const INT_CANDIDATES: [(IntWidth, i64, i64); 3] = [
	(IntWidth::W8, i8::MIN as i64, i8::MAX as i64),
	(IntWidth::W16, i16::MIN as i64, i16::MAX as i64),
	(IntWidth::W32, i32::MIN as i64, i32::MAX as i64),
];

/// Propose the configured target width for every float column wider than it. The values themselves are never inspected, so this is the one proposal that can lose information.
pub fn float_improvements(
	dataframe: &DataFrame,
	float_columns: &[String],
	target_width: FloatWidth,
	update_progress: &mut impl FnMut(CheckProgress),
) -> BTreeMap<String, NarrowColumnType> {
	let mut improvements = BTreeMap::new();
	// Narrowing to the default width would be a no-op.
	if target_width == FloatWidth::W64 {
		return improvements;
	}
	let progress_counter = ProgressCounter::new(n_values(dataframe, float_columns));
	update_progress(CheckProgress::FloatColumns(progress_counter.clone()));
	for column_name in float_columns {
		let column = dataframe.column(column_name).unwrap().as_float().unwrap();
		if target_width < column.width() {
			let narrow_type = match target_width {
				FloatWidth::W16 => NarrowColumnType::Float16,
				FloatWidth::W32 => NarrowColumnType::Float32,
				FloatWidth::W64 => unreachable!(),
			};
			improvements.insert(column_name.clone(), narrow_type);
		}
		progress_counter.inc(column.len().to_u64().unwrap());
	}
	improvements
}

/// Propose the narrowest integer width whose signed range contains each column's exact minimum and maximum. Columns whose values exceed the 32 bit range, and columns already stored at the best width, get no proposal.
pub fn int_improvements(
	dataframe: &DataFrame,
	int_columns: &[String],
	update_progress: &mut impl FnMut(CheckProgress),
) -> BTreeMap<String, NarrowColumnType> {
	let mut improvements = BTreeMap::new();
	let progress_counter = ProgressCounter::new(n_values(dataframe, int_columns));
	update_progress(CheckProgress::IntColumns(progress_counter.clone()));
	for column_name in int_columns {
		let column = dataframe.column(column_name).unwrap().as_int().unwrap();
		if let Some((min, max)) = column.min_max() {
			let fit = INT_CANDIDATES
				.iter()
				.find(|(_, range_min, range_max)| min >= *range_min && max <= *range_max);
			if let Some((width, _, _)) = fit {
				if *width < column.width() {
					let narrow_type = match width {
						IntWidth::W8 => NarrowColumnType::Int8,
						IntWidth::W16 => NarrowColumnType::Int16,
						IntWidth::W32 => NarrowColumnType::Int32,
						IntWidth::W64 => unreachable!(),
					};
					improvements.insert(column_name.clone(), narrow_type);
				}
			}
		}
		progress_counter.inc(column.len().to_u64().unwrap());
	}
	improvements
}

/// Propose dictionary encoding for every string column whose distinct value count is at or below the threshold.
pub fn enum_improvements(
	dataframe: &DataFrame,
	text_columns: &[String],
	categorical_threshold: usize,
	update_progress: &mut impl FnMut(CheckProgress),
) -> BTreeMap<String, NarrowColumnType> {
	let mut improvements = BTreeMap::new();
	let progress_counter = ProgressCounter::new(n_values(dataframe, text_columns));
	update_progress(CheckProgress::TextColumns(progress_counter.clone()));
	for column_name in text_columns {
		let column = dataframe.column(column_name).unwrap().as_text().unwrap();
		if column.n_unique() <= categorical_threshold {
			improvements.insert(column_name.clone(), NarrowColumnType::Enum);
		}
		progress_counter.inc(column.data.len().to_u64().unwrap());
	}
	improvements
}

fn n_values(dataframe: &DataFrame, column_names: &[String]) -> u64 {
	column_names
		.iter()
		.map(|column_name| dataframe.column(column_name).unwrap().len())
		.sum::<usize>()
		.to_u64()
		.unwrap()
}
