use std::collections::HashMap;
use std::fs;
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use log::info;

use super::error::EtlError;

/// Convert one worksheet of an xlsx file to a CSV file.
///
/// The first `skip_rows` rows of the sheet are dropped, the next row is the
/// header, every row after it is data.  Fully blank data rows are skipped.
/// The CSV has no index column and `csv_path` is overwritten if it exists.
/// Return the number of data rows written.
pub fn convert(
    xlsx_path: &Path,
    csv_path: &Path,
    sheet_name: &str,
    skip_rows: usize,
) -> Result<usize, EtlError> {
    let mut workbook: Xlsx<_> = open_workbook(xlsx_path)?;
    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet_name) {
        return Err(EtlError::MissingSheet {
            path: xlsx_path.to_path_buf(),
            sheet: sheet_name.to_string(),
            available,
        });
    }
    let range = workbook.worksheet_range(sheet_name)?;
    let missing_header = || EtlError::MissingHeader {
        sheet: sheet_name.to_string(),
        skip_rows,
    };

    // positions are absolute, row 0 is the first row of the sheet
    let (last_row, last_col) = range.end().ok_or_else(missing_header)?;
    let header_row = u32::try_from(skip_rows).map_err(|_| missing_header())?;
    if header_row > last_row {
        return Err(missing_header());
    }

    if let Some(dir) = csv_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(csv_path)?;
    wtr.write_record(header(&range, header_row, last_col))?;

    let mut count = 0;
    for row in header_row + 1..=last_row {
        let record: Vec<String> = (0..=last_col)
            .map(|col| render(range.get_value((row, col))))
            .collect();
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        wtr.write_record(&record)?;
        count += 1;
    }
    wtr.flush()?;
    info!(
        "Wrote {} rows from sheet {:?} to {}",
        count,
        sheet_name,
        csv_path.display()
    );
    Ok(count)
}

/// Column names from the header row.  Blank cells become `Unnamed: <i>`,
/// repeated names get a `.1`, `.2`, ... suffix.
fn header(range: &Range<Data>, row: u32, last_col: u32) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    (0..=last_col)
        .map(|col| {
            let mut name = render(range.get_value((row, col)));
            if name.is_empty() {
                name = format!("Unnamed: {}", col);
            }
            let n = seen.entry(name.clone()).or_insert(0);
            let out = if *n == 0 {
                name
            } else {
                format!("{}.{}", name, n)
            };
            *n += 1;
            out
        })
        .collect()
}

fn render(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) | Some(Data::Error(_)) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Float(x)) => render_float(*x),
        Some(Data::Bool(true)) => "True".to_string(),
        Some(Data::Bool(false)) => "False".to_string(),
        Some(Data::DateTime(dt)) => match dt.as_datetime() {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => render_float(dt.as_f64()),
        },
        Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => s.clone(),
    }
}

/// Excel stores every number as a float, write whole values as integers.
fn render_float(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        (x as i64).to_string()
    } else {
        x.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;
    use crate::etl::testing::{renewables_workbook, write_workbook, Cell::*};

    #[test]
    fn convert_renewables_sheet() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let xlsx = dir.path().join("generacion.xlsx");
        renewables_workbook(&xlsx)?;
        let csv_path = dir.path().join("out").join("erenovables.csv");

        let n = convert(&xlsx, &csv_path, "Base de Datos", 1)?;
        assert_eq!(n, 3);

        let content = fs::read_to_string(&csv_path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "AÑO,MES,CENTRAL,TECNOLOGIA,ENERGIA",
                "2024,1,\"ARAUCO, EÓLICO\",EOL,1234.5",
                "2024,1,CAÑADON LEON,EOL,987",
                "2024,2,\"PUNTA \"\"NORTE\"\"\",SOL,",
            ]
        );
        Ok(())
    }

    #[test]
    fn header_row_without_skip() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let xlsx = dir.path().join("book.xlsx");
        let rows = vec![
            vec![Str("id"), Empty, Str("value"), Str("value")],
            vec![Num(1.0), Str("x"), Num(0.25), Bool(true)],
            vec![Empty, Empty, Empty, Empty],
            vec![Num(2.0), Str("y"), Num(-3.0), Bool(false)],
        ];
        write_workbook(&xlsx, &[("Sheet1", rows)])?;
        let csv_path = dir.path().join("book.csv");

        let n = convert(&xlsx, &csv_path, "Sheet1", 0)?;
        assert_eq!(n, 2);
        assert_eq!(
            fs::read_to_string(&csv_path)?,
            "id,Unnamed: 1,value,value.1\n1,x,0.25,True\n2,y,-3,False\n"
        );
        Ok(())
    }

    #[test]
    fn date_cells() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let xlsx = dir.path().join("book.xlsx");
        let rows = vec![
            vec![Str("fecha"), Str("energia")],
            vec![Date("2024-01-01 00:00:00"), Num(10.0)],
            vec![Date("2024-02-15 12:00:00"), Num(12.5)],
        ];
        write_workbook(&xlsx, &[("Sheet1", rows)])?;
        let csv_path = dir.path().join("book.csv");

        assert_eq!(convert(&xlsx, &csv_path, "Sheet1", 0)?, 2);
        assert_eq!(
            fs::read_to_string(&csv_path)?,
            "fecha,energia\n2024-01-01 00:00:00,10\n2024-02-15 12:00:00,12.5\n"
        );
        Ok(())
    }

    #[test]
    fn output_is_overwritten() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let xlsx = dir.path().join("generacion.xlsx");
        renewables_workbook(&xlsx)?;
        let csv_path = dir.path().join("erenovables.csv");
        fs::write(&csv_path, "stale\n".repeat(100))?;

        convert(&xlsx, &csv_path, "Base de Datos", 1)?;
        let content = fs::read_to_string(&csv_path)?;
        assert!(!content.contains("stale"));
        assert_eq!(content.lines().count(), 4);
        Ok(())
    }

    #[test]
    fn missing_sheet() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let xlsx = dir.path().join("generacion.xlsx");
        renewables_workbook(&xlsx)?;
        let err = convert(&xlsx, &dir.path().join("out.csv"), "Datos", 1).unwrap_err();
        match err {
            EtlError::MissingSheet { sheet, available, .. } => {
                assert_eq!(sheet, "Datos");
                assert_eq!(available, vec!["Notas", "Base de Datos"]);
            }
            e => panic!("unexpected error {e}"),
        }
        Ok(())
    }

    #[test]
    fn missing_header() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let xlsx = dir.path().join("generacion.xlsx");
        renewables_workbook(&xlsx)?;
        let err = convert(&xlsx, &dir.path().join("out.csv"), "Base de Datos", 5).unwrap_err();
        assert!(matches!(err, EtlError::MissingHeader { skip_rows: 5, .. }));
        Ok(())
    }

    #[test]
    fn render_float_test() {
        assert_eq!(render_float(2024.0), "2024");
        assert_eq!(render_float(-0.5), "-0.5");
        assert_eq!(render_float(0.1), "0.1");
        assert_eq!(render_float(1e20), "100000000000000000000");
    }
}
