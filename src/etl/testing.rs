//! Fixtures shared by the unit tests.

use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use zip::{write::SimpleFileOptions, ZipWriter};

#[derive(Debug, Clone, Copy)]
pub enum Cell<'a> {
    Str(&'a str),
    Num(f64),
    Bool(bool),
    /// `yyyy-mm-dd hh:mm:ss`, written as a date cell
    Date(&'a str),
    Empty,
}

/// Write a zip archive with the given members, in order.
pub fn write_zip(path: &Path, members: &[(&str, &[u8])]) -> Result<(), Box<dyn Error>> {
    let mut zip = ZipWriter::new(File::create(path)?);
    for (name, content) in members {
        zip.start_file(*name, SimpleFileOptions::default())?;
        zip.write_all(content)?;
    }
    zip.finish()?;
    Ok(())
}

/// Write a workbook with one sheet per `(name, rows)` pair.
pub fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Cell>>)]) -> Result<(), Box<dyn Error>> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;
        for (i, row) in rows.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                let (i, j) = (i as u32, j as u16);
                match cell {
                    Cell::Str(s) => {
                        worksheet.write_string(i, j, *s)?;
                    }
                    Cell::Num(x) => {
                        worksheet.write_number(i, j, *x)?;
                    }
                    Cell::Bool(b) => {
                        worksheet.write_boolean(i, j, *b)?;
                    }
                    Cell::Date(s) => {
                        let dt = ExcelDateTime::parse_from_str(s)?;
                        worksheet.write_datetime_with_format(i, j, &dt, &date_format)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

/// A small copy of the renewable generation workbook: a title row, the
/// header, three data rows, and a notes sheet in front of it.
pub fn renewables_workbook(path: &Path) -> Result<(), Box<dyn Error>> {
    use Cell::*;
    let data = vec![
        vec![Str("Generación Renovable Mensual (MWh)")],
        vec![
            Str("AÑO"),
            Str("MES"),
            Str("CENTRAL"),
            Str("TECNOLOGIA"),
            Str("ENERGIA"),
        ],
        vec![Num(2024.0), Num(1.0), Str("ARAUCO, EÓLICO"), Str("EOL"), Num(1234.5)],
        vec![Num(2024.0), Num(1.0), Str("CAÑADON LEON"), Str("EOL"), Num(987.0)],
        vec![Num(2024.0), Num(2.0), Str("PUNTA \"NORTE\""), Str("SOL"), Empty],
    ];
    let notes = vec![vec![Str("Fuente: CAMMESA")]];
    write_workbook(path, &[("Notas", notes), ("Base de Datos", data)])
}
