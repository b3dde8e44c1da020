use super::NarrowColumnType;
use num_traits::ToPrimitive;
use slimframe_dataframe::{Column, DataFrame, FloatWidth, IntWidth};
use slimframe_util::bytes::DisplayBytes;
use std::collections::BTreeMap;

/// This struct is the output of shrinking a dataframe.
pub struct ShrinkOutput {
	/// The new dataframe, with every proposed column rebuilt under its lower memory type.
	pub dataframe: DataFrame,
	/// The memory footprint of the original dataframe and the new one.
	pub memory: MemoryComparison,
}

/// Deep memory totals for a dataframe before and after shrinking. The `Display` impl renders the human readable report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryComparison {
	pub original_size_bytes: usize,
	pub shrunk_size_bytes: usize,
}

impl std::fmt::Display for MemoryComparison {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		writeln!(
			f,
			"original dataframe memory: {}",
			DisplayBytes(self.original_size_bytes.to_u64().unwrap()),
		)?;
		write!(
			f,
			"shrunk dataframe memory: {}",
			DisplayBytes(self.shrunk_size_bytes.to_u64().unwrap()),
		)
	}
}

pub fn shrink_dataframe(
	dataframe: &DataFrame,
	improvements: &BTreeMap<String, NarrowColumnType>,
) -> ShrinkOutput {
	let columns = dataframe
		.columns
		.iter()
		.map(|column| match improvements.get(column.name()) {
			Some(narrow_type) => cast_column(column, *narrow_type),
			None => column.clone(),
		})
		.collect();
	let shrunk = DataFrame { columns };
	let memory = MemoryComparison {
		original_size_bytes: dataframe.memory_size(),
		shrunk_size_bytes: shrunk.memory_size(),
	};
	ShrinkOutput {
		dataframe: shrunk,
		memory,
	}
}

fn cast_column(column: &Column, narrow_type: NarrowColumnType) -> Column {
	match (column, narrow_type) {
		(Column::Int(column), NarrowColumnType::Int8) => Column::Int(column.cast(IntWidth::W8)),
		(Column::Int(column), NarrowColumnType::Int16) => Column::Int(column.cast(IntWidth::W16)),
		(Column::Int(column), NarrowColumnType::Int32) => Column::Int(column.cast(IntWidth::W32)),
		(Column::Float(column), NarrowColumnType::Float16) => {
			Column::Float(column.cast(FloatWidth::W16))
		}
		(Column::Float(column), NarrowColumnType::Float32) => {
			Column::Float(column.cast(FloatWidth::W32))
		}
		(Column::Text(column), NarrowColumnType::Enum) => Column::Enum(column.to_enum()),
		// Each analyzer only pairs a column kind with targets of that same kind.
		_ => unreachable!(),
	}
}

#[cfg(test)]
use super::{CheckerSettings, MemoryChecker};

#[test]
fn test_shrink_output() {
	let dataframe = super::test_dataframe();
	let mut checker = MemoryChecker::new(&dataframe, CheckerSettings::default()).unwrap();
	checker.identify_improvements(&mut |_| {});
	let output = checker.shrink().unwrap();
	// The integer column keeps its exact values at the narrower width.
	let column = output.dataframe.column("a").unwrap().as_int().unwrap();
	assert_eq!(column.width(), IntWidth::W8);
	let values: Vec<i64> = column.data.iter_i64().collect();
	let original: Vec<i64> = dataframe
		.column("a")
		.unwrap()
		.as_int()
		.unwrap()
		.data
		.iter_i64()
		.collect();
	assert_eq!(values, original);
	// The string column becomes an enum column whose values decode back to the originals.
	let column = output.dataframe.column("b").unwrap().as_enum().unwrap();
	assert_eq!(column.options, vec!["x".to_owned(), "y".to_owned()]);
	assert_eq!(column.get(0), Some("x"));
	assert_eq!(column.get(1), Some("y"));
	// The float column only changes storage width.
	let column = output.dataframe.column("c").unwrap().as_float().unwrap();
	assert_eq!(column.width(), FloatWidth::W16);
	// Columns without a proposal pass through unchanged.
	let column = output.dataframe.column("d").unwrap().as_boolean().unwrap();
	assert_eq!(
		column.data,
		dataframe.column("d").unwrap().as_boolean().unwrap().data,
	);
	// The original dataframe is untouched and the new one is smaller.
	assert_eq!(output.memory.original_size_bytes, dataframe.memory_size());
	assert!(output.memory.shrunk_size_bytes < output.memory.original_size_bytes);
	let report = output.memory.to_string();
	assert!(report.starts_with("original dataframe memory: "));
	assert!(report.contains("shrunk dataframe memory: "));
}
