use std::{fs, path::Path};

use dividata::{
    cli::extract::extract,
    services::{
        documents::{DocumentLoader, PdfExtractLoader},
        importers::lynx::{extract_9a_trades, extract_costs, extract_dividends},
    },
};
use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, Stream,
};
use rust_decimal_macros::dec;

const COLUMN_STEP: i64 = 110;

/// Writes a one page PDF placing every cell with its own text matrix, the way report
/// generators lay out tables.
fn write_table_pdf(path: &Path, title: &str, rows: &[&[&str]]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let place = |text: &str, x: i64, y: i64| {
        vec![
            Operation::new(
                "Tm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), x.into(), y.into()],
            ),
            Operation::new("Tj", vec![Object::string_literal(text)]),
        ]
    };
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 10.into()]),
    ];
    operations.extend(place(title, 50, 780));
    for (row_index, row) in rows.iter().enumerate() {
        let y = 720 - 20 * row_index as i64;
        for (column, cell) in row.iter().enumerate() {
            operations.extend(place(cell, 50 + COLUMN_STEP * column as i64, y));
        }
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    fs::write(path, buffer).unwrap();
}

#[test]
fn positioned_cells_become_table_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("9a_2023.pdf");
    write_table_pdf(
        &path,
        "Luovutukset",
        &[
            &["NOKIA", "2023-05-02", "100", "4.10"],
            &["UPM", "2023-06-01", "50", "30.25"],
        ],
    );

    let document = PdfExtractLoader.open(&path).unwrap();
    assert_eq!(document.page_count(), 1);
    let page = document.page(0).unwrap();
    assert!(page.text.contains("NOKIA 2023-05-02 100 4.10"));
    assert_eq!(page.tables.len(), 1);
    assert_eq!(
        page.tables[0][1],
        vec![
            Some("UPM".to_string()),
            Some("2023-06-01".to_string()),
            Some("50".to_string()),
            Some("30.25".to_string()),
        ]
    );

    let trades = extract_9a_trades(&PdfExtractLoader, &path);
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].symbol, "NOKIA");
    assert_eq!(trades[1].date, "2023-06-01");
    assert_eq!(trades[1].amounts.last(), Some(&dec!(30.25)));
}

#[test]
fn cost_and_dividend_tables_from_real_pdfs() {
    let dir = tempfile::tempdir().unwrap();
    let costs_path = dir.path().join("costs_2023.pdf");
    write_table_pdf(&costs_path, "Kulut", &[&["Commissions", "12.50"]]);
    let costs = extract_costs(&PdfExtractLoader, &costs_path);
    assert_eq!(costs.len(), 1);
    assert_eq!(costs[0].description, "Commissions | 12.50");
    assert_eq!(costs[0].amounts, vec![dec!(12.50)]);

    let dividends_path = dir.path().join("dividends_2023.pdf");
    write_table_pdf(
        &dividends_path,
        "Dividends",
        &[&["AAPL", "2024-01-15", "Dividend", "1.50", "USD"]],
    );
    let dividends = extract_dividends(&PdfExtractLoader, &dividends_path).unwrap();
    assert_eq!(dividends.len(), 1);
    assert_eq!(dividends[0].symbol, "AAPL");
    assert_eq!(dividends[0].source, "lynx_pdf");
}

#[test]
fn extraction_run_over_real_pdfs() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_table_pdf(
        &input.path().join("9a_2023.pdf"),
        "Luovutukset",
        &[&["NOKIA", "2023-05-02", "100", "4.10"]],
    );
    write_table_pdf(
        &input.path().join("16b_2023.pdf"),
        "Total 12,345.67",
        &[],
    );

    let results = extract(input.path(), output.path(), &PdfExtractLoader).unwrap();
    assert_eq!(results.trades.len(), 1);
    assert_eq!(results.summaries.len(), 1);
    assert_eq!(results.summaries[0].amounts, vec!["12,345.67"]);
    assert!(output.path().join("9a_trades.json").exists());
}
