use licman::Record;

use super::terminal::{Colorize, is_narrow};

/// Prints `records` as aligned columns, or one block per record on narrow
/// terminals.
///
/// Only `columns` are shown, in that order. A `status` column is coloured.
pub fn print_records(records: &[Record], columns: &[&str]) {
    if records.is_empty() {
        println!("{}", "No records found.".dim());
        return;
    }

    if is_narrow() {
        for record in records {
            for &column in columns {
                println!("{column}: {}", cell(record, column));
            }
            println!();
        }
        return;
    }

    let widths: Vec<usize> = columns
        .iter()
        .map(|&column| {
            records
                .iter()
                .map(|r| r.value(column).chars().count())
                .max()
                .unwrap_or(0)
                .max(column.len())
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{column:<width$}"))
        .collect();
    println!("{}", header.join("  ").trim_end());
    println!("{}", "─".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)).dim());

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(&column, &width)| {
                let value = record.value(column);
                let pad = " ".repeat(width.saturating_sub(value.chars().count()));
                format!("{}{pad}", cell(record, column))
            })
            .collect();
        println!("{}", row.join("  ").trim_end());
    }
}

fn cell(record: &Record, column: &str) -> String {
    let value = record.value(column);
    if column == "status" {
        value.status()
    } else {
        value.to_string()
    }
}
