/*!
This crate provides a basic implementation of dataframes, which are two dimensional arrays of data where each column can have a different data type, like a spreadsheet. This crate is similar to Python's Pandas library, but at present is incredibly limited, because it only implements the features needed to support Slimframe: numeric columns can be stored at several physical widths, string columns can be dictionary encoded, and every column can report its exact memory footprint.
*/

use fnv::FnvHashSet;
use half::f16;
use num_traits::ToPrimitive;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;

pub mod load;

pub use self::load::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Unknown(UnknownColumn),
	Boolean(BooleanColumn),
	Int(IntColumn),
	Float(FloatColumn),
	Enum(EnumColumn),
	Text(TextColumn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownColumn {
	pub name: String,
	pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanColumn {
	pub name: String,
	pub data: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntColumn {
	pub name: String,
	pub data: IntColumnData,
}

/// The physical storage of an integer column, one vector per supported width.
#[derive(Debug, Clone, PartialEq)]
pub enum IntColumnData {
	I8(Vec<i8>),
	I16(Vec<i16>),
	I32(Vec<i32>),
	I64(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatColumn {
	pub name: String,
	pub data: FloatColumnData,
}

/// The physical storage of a float column, one vector per supported width.
#[derive(Debug, Clone, PartialEq)]
pub enum FloatColumnData {
	F16(Vec<f16>),
	F32(Vec<f32>),
	F64(Vec<f64>),
}

/// An enum column holds a dictionary of its distinct string options and stores each value as a one-based index into that dictionary. `None` marks a value that is not one of the options.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumn {
	pub name: String,
	pub options: Vec<String>,
	pub data: Vec<Option<NonZeroUsize>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
	pub name: String,
	pub data: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum ColumnType {
	Unknown,
	Boolean,
	Int { width: IntWidth },
	Float { width: FloatWidth },
	Enum { options: Vec<String> },
	Text,
}

/// Integer widths, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntWidth {
	W8,
	W16,
	W32,
	W64,
}

/// Float widths, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FloatWidth {
	W16,
	W32,
	W64,
}

impl DataFrame {
	pub fn new(column_names: Vec<String>, column_types: Vec<ColumnType>) -> Self {
		let columns = column_names
			.into_iter()
			.zip(column_types.into_iter())
			.map(|(column_name, column_type)| match column_type {
				ColumnType::Unknown => Column::Unknown(UnknownColumn::new(column_name)),
				ColumnType::Boolean => Column::Boolean(BooleanColumn::new(column_name)),
				ColumnType::Int { width } => Column::Int(IntColumn::new(column_name, width)),
				ColumnType::Float { width } => Column::Float(FloatColumn::new(column_name, width)),
				ColumnType::Enum { options } => Column::Enum(EnumColumn::new(column_name, options)),
				ColumnType::Text => Column::Text(TextColumn::new(column_name)),
			})
			.collect();
		Self { columns }
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}

	/// Return the total memory used by the values of this dataframe, including variable size payloads such as string contents.
	pub fn memory_size(&self) -> usize {
		self.columns.iter().map(|column| column.memory_size()).sum()
	}
}

impl Column {
	pub fn len(&self) -> usize {
		match self {
			Self::Unknown(s) => s.len,
			Self::Boolean(s) => s.data.len(),
			Self::Int(s) => s.len(),
			Self::Float(s) => s.len(),
			Self::Enum(s) => s.data.len(),
			Self::Text(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Unknown(s) => s.name.as_str(),
			Self::Boolean(s) => s.name.as_str(),
			Self::Int(s) => s.name.as_str(),
			Self::Float(s) => s.name.as_str(),
			Self::Enum(s) => s.name.as_str(),
			Self::Text(s) => s.name.as_str(),
		}
	}

	pub fn as_boolean(&self) -> Option<&BooleanColumn> {
		match self {
			Self::Boolean(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<&IntColumn> {
		match self {
			Self::Int(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<&FloatColumn> {
		match self {
			Self::Float(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_enum(&self) -> Option<&EnumColumn> {
		match self {
			Self::Enum(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&TextColumn> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}

	pub fn memory_size(&self) -> usize {
		match self {
			Self::Unknown(_) => 0,
			Self::Boolean(s) => s.data.len() * std::mem::size_of::<bool>(),
			Self::Int(s) => s.memory_size(),
			Self::Float(s) => s.memory_size(),
			Self::Enum(s) => s.memory_size(),
			Self::Text(s) => s.memory_size(),
		}
	}
}

impl UnknownColumn {
	pub fn new(name: String) -> Self {
		Self { name, len: 0 }
	}
}

impl BooleanColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}
}

impl IntColumn {
	pub fn new(name: String, width: IntWidth) -> Self {
		let data = match width {
			IntWidth::W8 => IntColumnData::I8(Vec::new()),
			IntWidth::W16 => IntColumnData::I16(Vec::new()),
			IntWidth::W32 => IntColumnData::I32(Vec::new()),
			IntWidth::W64 => IntColumnData::I64(Vec::new()),
		};
		Self { name, data }
	}

	pub fn len(&self) -> usize {
		match &self.data {
			IntColumnData::I8(data) => data.len(),
			IntColumnData::I16(data) => data.len(),
			IntColumnData::I32(data) => data.len(),
			IntColumnData::I64(data) => data.len(),
		}
	}

	pub fn width(&self) -> IntWidth {
		match &self.data {
			IntColumnData::I8(_) => IntWidth::W8,
			IntColumnData::I16(_) => IntWidth::W16,
			IntColumnData::I32(_) => IntWidth::W32,
			IntColumnData::I64(_) => IntWidth::W64,
		}
	}

	/// Append a value, converting it to the column's physical width. Returns false if the value does not fit.
	pub fn push(&mut self, value: i64) -> bool {
		match &mut self.data {
			IntColumnData::I8(data) => match value.to_i8() {
				Some(value) => {
					data.push(value);
					true
				}
				None => false,
			},
			IntColumnData::I16(data) => match value.to_i16() {
				Some(value) => {
					data.push(value);
					true
				}
				None => false,
			},
			IntColumnData::I32(data) => match value.to_i32() {
				Some(value) => {
					data.push(value);
					true
				}
				None => false,
			},
			IntColumnData::I64(data) => {
				data.push(value);
				true
			}
		}
	}

	/// Return the exact minimum and maximum over all values, or `None` if the column is empty.
	pub fn min_max(&self) -> Option<(i64, i64)> {
		let mut iter = self.data.iter_i64();
		let first = iter.next()?;
		let mut min = first;
		let mut max = first;
		for value in iter {
			min = min.min(value);
			max = max.max(value);
		}
		Some((min, max))
	}

	/// Cast this column to the given width. The caller must ensure every value fits the target width.
	pub fn cast(&self, width: IntWidth) -> IntColumn {
		let data = match width {
			IntWidth::W8 => IntColumnData::I8(
				self.data
					.iter_i64()
					.map(|value| value.to_i8().unwrap())
					.collect(),
			),
			IntWidth::W16 => IntColumnData::I16(
				self.data
					.iter_i64()
					.map(|value| value.to_i16().unwrap())
					.collect(),
			),
			IntWidth::W32 => IntColumnData::I32(
				self.data
					.iter_i64()
					.map(|value| value.to_i32().unwrap())
					.collect(),
			),
			IntWidth::W64 => IntColumnData::I64(self.data.iter_i64().collect()),
		};
		IntColumn {
			name: self.name.clone(),
			data,
		}
	}

	pub fn memory_size(&self) -> usize {
		match &self.data {
			IntColumnData::I8(data) => data.len() * std::mem::size_of::<i8>(),
			IntColumnData::I16(data) => data.len() * std::mem::size_of::<i16>(),
			IntColumnData::I32(data) => data.len() * std::mem::size_of::<i32>(),
			IntColumnData::I64(data) => data.len() * std::mem::size_of::<i64>(),
		}
	}
}

impl IntColumnData {
	pub fn iter_i64<'a>(&'a self) -> Box<dyn Iterator<Item = i64> + 'a> {
		match self {
			IntColumnData::I8(data) => Box::new(data.iter().map(|value| value.to_i64().unwrap())),
			IntColumnData::I16(data) => Box::new(data.iter().map(|value| value.to_i64().unwrap())),
			IntColumnData::I32(data) => Box::new(data.iter().map(|value| value.to_i64().unwrap())),
			IntColumnData::I64(data) => Box::new(data.iter().copied()),
		}
	}
}

impl FloatColumn {
	pub fn new(name: String, width: FloatWidth) -> Self {
		let data = match width {
			FloatWidth::W16 => FloatColumnData::F16(Vec::new()),
			FloatWidth::W32 => FloatColumnData::F32(Vec::new()),
			FloatWidth::W64 => FloatColumnData::F64(Vec::new()),
		};
		Self { name, data }
	}

	pub fn len(&self) -> usize {
		match &self.data {
			FloatColumnData::F16(data) => data.len(),
			FloatColumnData::F32(data) => data.len(),
			FloatColumnData::F64(data) => data.len(),
		}
	}

	pub fn width(&self) -> FloatWidth {
		match &self.data {
			FloatColumnData::F16(_) => FloatWidth::W16,
			FloatColumnData::F32(_) => FloatWidth::W32,
			FloatColumnData::F64(_) => FloatWidth::W64,
		}
	}

	/// Append a value, converting it to the column's physical width.
	pub fn push(&mut self, value: f64) {
		match &mut self.data {
			FloatColumnData::F16(data) => data.push(f16::from_f64(value)),
			FloatColumnData::F32(data) => data.push(value.to_f32().unwrap()),
			FloatColumnData::F64(data) => data.push(value),
		}
	}

	/// Cast this column to the given width. Casting to a narrower width loses precision.
	pub fn cast(&self, width: FloatWidth) -> FloatColumn {
		let data = match width {
			FloatWidth::W16 => FloatColumnData::F16(self.data.iter_f64().map(f16::from_f64).collect()),
			FloatWidth::W32 => FloatColumnData::F32(
				self.data
					.iter_f64()
					.map(|value| value.to_f32().unwrap())
					.collect(),
			),
			FloatWidth::W64 => FloatColumnData::F64(self.data.iter_f64().collect()),
		};
		FloatColumn {
			name: self.name.clone(),
			data,
		}
	}

	pub fn memory_size(&self) -> usize {
		match &self.data {
			FloatColumnData::F16(data) => data.len() * std::mem::size_of::<f16>(),
			FloatColumnData::F32(data) => data.len() * std::mem::size_of::<f32>(),
			FloatColumnData::F64(data) => data.len() * std::mem::size_of::<f64>(),
		}
	}
}

impl FloatColumnData {
	pub fn iter_f64<'a>(&'a self) -> Box<dyn Iterator<Item = f64> + 'a> {
		match self {
			FloatColumnData::F16(data) => Box::new(data.iter().map(|value| value.to_f64())),
			FloatColumnData::F32(data) => Box::new(data.iter().map(|value| f64::from(*value))),
			FloatColumnData::F64(data) => Box::new(data.iter().copied()),
		}
	}
}

impl EnumColumn {
	pub fn new(name: String, options: Vec<String>) -> Self {
		Self {
			name,
			options,
			data: Vec::new(),
		}
	}

	/// Look up the option string for the value at `index`.
	pub fn get(&self, index: usize) -> Option<&str> {
		self.data[index].map(move |position| self.options[position.get() - 1].as_str())
	}

	pub fn memory_size(&self) -> usize {
		let options_size: usize = self
			.options
			.iter()
			.map(|option| option.len() + std::mem::size_of::<String>())
			.sum();
		self.data.len() * std::mem::size_of::<Option<NonZeroUsize>>() + options_size
	}
}

impl TextColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}

	/// Count the number of distinct values in this column.
	pub fn n_unique(&self) -> usize {
		let unique_values: FnvHashSet<&str> =
			self.data.iter().map(|value| value.as_str()).collect();
		unique_values.len()
	}

	/// Dictionary encode this column. The options are the sorted distinct values and each value becomes a one-based index into them.
	pub fn to_enum(&self) -> EnumColumn {
		let options: BTreeSet<&str> = self.data.iter().map(|value| value.as_str()).collect();
		let options: Vec<String> = options.into_iter().map(|option| option.to_owned()).collect();
		let data = self
			.data
			.iter()
			.map(|value| {
				options
					.binary_search_by(|option| option.as_str().cmp(value.as_str()))
					.ok()
					.map(|position| NonZeroUsize::new(position + 1).unwrap())
			})
			.collect();
		EnumColumn {
			name: self.name.clone(),
			options,
			data,
		}
	}

	pub fn memory_size(&self) -> usize {
		self.data
			.iter()
			.map(|value| value.len() + std::mem::size_of::<String>())
			.sum()
	}
}

#[test]
fn test_min_max() {
	let column = IntColumn {
		name: "test".to_owned(),
		data: IntColumnData::I64(vec![3, -7, 12, 0]),
	};
	assert_eq!(column.min_max(), Some((-7, 12)));
	let empty = IntColumn::new("empty".to_owned(), IntWidth::W64);
	assert_eq!(empty.min_max(), None);
}

#[test]
fn test_int_cast_roundtrip() {
	let column = IntColumn {
		name: "test".to_owned(),
		data: IntColumnData::I64(vec![-128, 0, 127]),
	};
	let cast = column.cast(IntWidth::W8);
	assert_eq!(cast.width(), IntWidth::W8);
	let values: Vec<i64> = cast.data.iter_i64().collect();
	assert_eq!(values, vec![-128, 0, 127]);
}

#[test]
fn test_text_to_enum() {
	let column = TextColumn {
		name: "test".to_owned(),
		data: vec![
			"y".to_owned(),
			"x".to_owned(),
			"y".to_owned(),
			"z".to_owned(),
		],
	};
	assert_eq!(column.n_unique(), 3);
	let column = column.to_enum();
	assert_eq!(column.options, vec!["x", "y", "z"]);
	assert_eq!(column.get(0), Some("y"));
	assert_eq!(column.get(1), Some("x"));
	assert_eq!(column.get(3), Some("z"));
}

#[test]
fn test_memory_size() {
	let string_size = std::mem::size_of::<String>();
	let column = Column::Text(TextColumn {
		name: "test".to_owned(),
		data: vec!["aa".to_owned(), "b".to_owned()],
	});
	assert_eq!(column.memory_size(), 2 * string_size + 3);
	let column = Column::Int(IntColumn {
		name: "test".to_owned(),
		data: IntColumnData::I16(vec![1, 2, 3]),
	});
	assert_eq!(column.memory_size(), 6);
}
