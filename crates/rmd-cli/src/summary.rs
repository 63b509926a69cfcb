use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use rmd_cli::pipeline::RunReport;

pub fn print_summary(report: &RunReport) {
    println!("Output: {}", report.configuration_dir.display());
    match &report.numeric_file {
        Some(name) => println!("Numeric concepts: {name}"),
        None => println!("Numeric concepts: none"),
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Output"),
        header_cell("File"),
        header_cell("Items"),
        header_cell("Columns"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);

    for path in &report.extracted_packages {
        table.add_row(vec![
            kind_cell("bundled package"),
            Cell::new(file_name(path)),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    let mut total_items = 0usize;
    for package in &report.packages {
        total_items += package.items;
        table.add_row(vec![
            kind_cell("package"),
            Cell::new(file_name(&package.path)),
            count_cell(package.items),
            dim_cell("-"),
        ]);
    }
    let mut total_rows = 0usize;
    for csv in &report.csv_files {
        total_rows += csv.rows;
        table.add_row(vec![
            kind_cell("concepts"),
            Cell::new(file_name(&csv.path)),
            count_cell(csv.rows),
            Cell::new(csv.columns),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{} packages, {} CSV files",
            report.extracted_packages.len() + report.packages.len(),
            report.csv_files.len()
        ))
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold),
        Cell::new(total_items + total_rows).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");

    let mut dictionary = Table::new();
    dictionary.set_header(vec![header_cell("Reference"), header_cell("Known ids")]);
    apply_summary_table_style(&mut dictionary);
    align_column(&mut dictionary, 1, CellAlignment::Right);
    for (kind, size) in &report.dictionary_sizes {
        dictionary.add_row(vec![kind_cell(kind.label()), count_cell(*size)]);
    }
    println!();
    println!("{dictionary}");
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn kind_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::Blue)
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
