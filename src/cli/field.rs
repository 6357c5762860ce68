use crate::cli::InputArgs;
use crate::error::FlatError;
use crate::fields::{Field, FieldExtractor};

pub fn run(input: &InputArgs, row_number: usize, field_name: &str, required: bool) -> anyhow::Result<()> {
    // Validate the name before touching the file.
    let field: Field = field_name.parse()?;
    let settings = input.settings()?;
    let ex = FieldExtractor::new(settings.columns);

    let mut found = None;
    input
        .source_kind()?
        .for_each_row(&input.file, input.sheet.as_deref(), |n, row| {
            if n == row_number {
                found = Some(row);
                return Ok(false);
            }
            Ok(n < row_number)
        })?;
    let row = found.ok_or_else(|| {
        FlatError::Other(format!("Row {row_number} not found in {}", input.file.display()))
    })?;

    if required {
        println!("{}", ex.extract_required(&row, field, row_number)?);
    } else {
        match ex.extract(&row, field) {
            Some(value) => println!("{value}"),
            None => println!("(absent)"),
        }
    }
    Ok(())
}
