use super::*;
use anyhow::{format_err, Result};
use std::{collections::BTreeMap, num::NonZeroUsize, path::Path};

#[derive(Clone, Default)]
pub struct FromCsvOptions {
	pub column_types: Option<BTreeMap<String, ColumnType>>,
}

impl DataFrame {
	pub fn from_path(path: &Path, options: FromCsvOptions, progress: impl Fn(u64)) -> Result<Self> {
		Self::from_csv(&mut csv::Reader::from_path(path)?, options, progress)
	}

	pub fn from_csv<R>(
		reader: &mut csv::Reader<R>,
		options: FromCsvOptions,
		progress: impl Fn(u64),
	) -> Result<Self>
	where
		R: std::io::Read + std::io::Seek,
	{
		let column_names: Vec<String> = reader
			.headers()?
			.into_iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		let n_columns = column_names.len();
		let start_position = reader.position().clone();

		#[derive(Clone, Debug)]
		enum ColumnTypeOrInferStats {
			ColumnType(ColumnType),
			InferStats(InferStats),
		}

		// Retrieve any column types present in the options.
		let mut column_types: Vec<ColumnTypeOrInferStats> = if let Some(column_types) =
			options.column_types
		{
			column_names
				.iter()
				.map(|column_name| {
					column_types
						.get(column_name)
						.map(|column_type| ColumnTypeOrInferStats::ColumnType(column_type.clone()))
						.unwrap_or_else(|| ColumnTypeOrInferStats::InferStats(InferStats::new()))
				})
				.collect()
		} else {
			vec![ColumnTypeOrInferStats::InferStats(InferStats::new()); n_columns]
		};

		// Passing over the csv to infer column types is only necessary if one or more columns did not have its type specified.
		let needs_infer =
			column_types.iter().any(
				|column_type_or_infer_stats| match column_type_or_infer_stats {
					ColumnTypeOrInferStats::ColumnType(_) => false,
					ColumnTypeOrInferStats::InferStats(_) => true,
				},
			);

		// If the infer pass is necessary, pass over the dataset and infer the types for those columns whose types were not specified.
		let column_types: Vec<ColumnType> = if needs_infer {
			let mut infer_stats: Vec<(usize, &mut InferStats)> = column_types
				.iter_mut()
				.enumerate()
				.filter_map(
					|(index, column_type_or_infer_stats)| match column_type_or_infer_stats {
						ColumnTypeOrInferStats::ColumnType(_) => None,
						ColumnTypeOrInferStats::InferStats(infer_stats) => {
							Some((index, infer_stats))
						}
					},
				)
				.collect();
			let mut record = csv::StringRecord::new();
			while reader.read_record(&mut record)? {
				for (index, infer_stats) in infer_stats.iter_mut() {
					let value = record.get(*index).unwrap();
					infer_stats.update(value);
				}
			}
			let column_types = column_types
				.into_iter()
				.map(
					|column_type_or_infer_stats| match column_type_or_infer_stats {
						ColumnTypeOrInferStats::ColumnType(column_type) => column_type,
						ColumnTypeOrInferStats::InferStats(infer_stats) => infer_stats.finalize(),
					},
				)
				.collect();
			// After inference, return back to the beginning of the csv to load the values.
			reader.seek(start_position)?;
			column_types
		} else {
			column_types
				.into_iter()
				.map(
					|column_type_or_infer_stats| match column_type_or_infer_stats {
						ColumnTypeOrInferStats::ColumnType(column_type) => column_type,
						_ => unreachable!(),
					},
				)
				.collect()
		};

		// Read each csv record and insert the values into the columns of the dataframe.
		let mut dataframe = Self::new(column_names, column_types);
		let mut record = csv::ByteRecord::new();
		while reader.read_byte_record(&mut record)? {
			progress(record.position().unwrap().byte());
			for (column, value) in dataframe.columns.iter_mut().zip(record.iter()) {
				match column {
					Column::Unknown(column) => {
						column.len += 1;
					}
					Column::Boolean(column) => {
						let value = match value {
							b"true" => true,
							b"false" => false,
							_ => {
								return Err(format_err!(
									"could not parse {:?} as a boolean for column {:?}",
									String::from_utf8_lossy(value),
									column.name,
								))
							}
						};
						column.data.push(value);
					}
					Column::Int(column) => {
						let value = lexical::parse::<i64, &[u8]>(value).map_err(|_| {
							format_err!(
								"could not parse {:?} as an integer for column {:?}",
								String::from_utf8_lossy(value),
								column.name,
							)
						})?;
						if !column.push(value) {
							return Err(format_err!(
								"the value {} does not fit the width of column {:?}",
								value,
								column.name,
							));
						}
					}
					Column::Float(column) => {
						let value = match lexical::parse::<f64, &[u8]>(value) {
							Ok(value) if value.is_finite() => value,
							_ => f64::NAN,
						};
						column.push(value);
					}
					Column::Enum(column) => {
						let value = if let Ok(value) = std::str::from_utf8(value) {
							column
								.options
								.iter()
								.position(|option| option == value)
								.map(|position| NonZeroUsize::new(position + 1).unwrap())
						} else {
							None
						};
						column.data.push(value);
					}
					Column::Text(column) => {
						column.data.push(std::str::from_utf8(value)?.to_owned())
					}
				}
			}
		}
		Ok(dataframe)
	}
}

#[derive(Clone, Debug)]
pub struct InferStats {
	column_type: InferColumnType,
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum InferColumnType {
	Unknown,
	Boolean,
	Int,
	Float,
	Text,
}

impl InferStats {
	pub fn new() -> Self {
		Self {
			column_type: InferColumnType::Unknown,
		}
	}

	pub fn update(&mut self, value: &str) {
		self.column_type = match self.column_type {
			InferColumnType::Unknown => infer_value_type(value),
			InferColumnType::Boolean => match infer_value_type(value) {
				InferColumnType::Boolean => InferColumnType::Boolean,
				_ => InferColumnType::Text,
			},
			InferColumnType::Int => match infer_value_type(value) {
				InferColumnType::Int => InferColumnType::Int,
				InferColumnType::Float => InferColumnType::Float,
				_ => InferColumnType::Text,
			},
			InferColumnType::Float => match infer_value_type(value) {
				InferColumnType::Int | InferColumnType::Float => InferColumnType::Float,
				_ => InferColumnType::Text,
			},
			InferColumnType::Text => InferColumnType::Text,
		};
	}

	pub fn finalize(self) -> ColumnType {
		match self.column_type {
			InferColumnType::Unknown => ColumnType::Unknown,
			InferColumnType::Boolean => ColumnType::Boolean,
			// Inferred numeric columns always start at the widest width. The shrink crate is responsible for proposing anything narrower.
			InferColumnType::Int => ColumnType::Int {
				width: IntWidth::W64,
			},
			InferColumnType::Float => ColumnType::Float {
				width: FloatWidth::W64,
			},
			InferColumnType::Text => ColumnType::Text,
		}
	}
}

fn infer_value_type(value: &str) -> InferColumnType {
	if value == "true" || value == "false" {
		InferColumnType::Boolean
	} else if lexical::parse::<i64, &str>(value).is_ok() {
		InferColumnType::Int
	} else if lexical::parse::<f64, &str>(value)
		.map(|value| value.is_finite())
		.unwrap_or(false)
	{
		InferColumnType::Float
	} else {
		InferColumnType::Text
	}
}

#[test]
fn test_infer() {
	let csv = r#"count,size,flag,name
1,1.5,true,hello
2,2.5,false,world
"#;
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions::default(),
		|_| {},
	)
	.unwrap();
	assert_eq!(df.ncols(), 4);
	assert_eq!(df.nrows(), 2);
	insta::assert_debug_snapshot!(df, @r###"
 DataFrame {
     columns: [
         Int(
             IntColumn {
                 name: "count",
                 data: I64(
                     [
                         1,
                         2,
                     ],
                 ),
             },
         ),
         Float(
             FloatColumn {
                 name: "size",
                 data: F64(
                     [
                         1.5,
                         2.5,
                     ],
                 ),
             },
         ),
         Boolean(
             BooleanColumn {
                 name: "flag",
                 data: [
                     true,
                     false,
                 ],
             },
         ),
         Text(
             TextColumn {
                 name: "name",
                 data: [
                     "hello",
                     "world",
                 ],
             },
         ),
     ],
 }
 "###);
}

#[test]
fn test_column_types() {
	let csv = r#"count,color,name
1,red,hello
2,green,world
"#;
	let mut column_types = BTreeMap::new();
	column_types.insert(
		"count".to_owned(),
		ColumnType::Int {
			width: IntWidth::W8,
		},
	);
	column_types.insert(
		"color".to_owned(),
		ColumnType::Enum {
			options: vec!["green".to_owned(), "red".to_owned()],
		},
	);
	column_types.insert("name".to_owned(), ColumnType::Text);
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			column_types: Some(column_types),
		},
		|_| {},
	)
	.unwrap();
	insta::assert_debug_snapshot!(df, @r###"
 DataFrame {
     columns: [
         Int(
             IntColumn {
                 name: "count",
                 data: I8(
                     [
                         1,
                         2,
                     ],
                 ),
             },
         ),
         Enum(
             EnumColumn {
                 name: "color",
                 options: [
                     "green",
                     "red",
                 ],
                 data: [
                     Some(
                         2,
                     ),
                     Some(
                         1,
                     ),
                 ],
             },
         ),
         Text(
             TextColumn {
                 name: "name",
                 data: [
                     "hello",
                     "world",
                 ],
             },
         ),
     ],
 }
 "###);
}
