use reportr::document::ReportDocument;
use reportr::export::{export_rows, export_table_csv, ExportFormat, ExportOptions};
use reportr::formatting::StandardFormatting;
use reportr::report::ReportOptions;
use reportr::table::{Row, TableColumn, TableSpec};
use reportr::templates::{
    custom_report, mis_report, report_filename, CustomReportRequest, MisReportData,
};

fn read_csv(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader
        .headers()
        .unwrap()
        .iter()
        .map(String::from)
        .collect();
    let records = reader
        .records()
        .map(|record| record.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, records)
}

#[test]
fn exported_csv_reads_back_the_same_rows() {
    let rows: Vec<Row> = serde_json::from_str(
        r#"[
            { "Reference": "REF1", "Amount": "1,200" },
            { "Amount": 5000000, "Reference": "REF2 \"urgent\"" }
        ]"#,
    )
    .unwrap();
    let exported = export_rows(&rows, "Deals", ExportFormat::Csv, &ExportOptions::default()).unwrap();

    let (headers, records) = read_csv(&exported.bytes);
    assert_eq!(headers, vec!["Reference", "Amount"]);
    assert_eq!(
        records,
        vec![
            vec!["REF1".to_string(), "1,200".to_string()],
            vec!["REF2 \"urgent\"".to_string(), "5000000".to_string()],
        ]
    );
}

#[test]
fn table_dump_keeps_the_column_order() {
    let table = TableSpec::new(
        vec![
            TableColumn::new("A", "a"),
            TableColumn::new("B", "b"),
            TableColumn::new("C", "c"),
        ],
        (0..5)
            .map(|index| {
                Row::new()
                    .with("b", format!("b{index}"))
                    .with("c", format!("c{index}"))
                    .with("a", format!("a{index}"))
            })
            .collect(),
    );
    let exported =
        export_table_csv(&table, "blotter", time::macros::date!(2026 - 03 - 09)).unwrap();
    assert_eq!(exported.filename, "blotter_2026-03-09.csv");

    let (headers, records) = read_csv(&exported.bytes);
    assert_eq!(headers, vec!["A", "B", "C"]);
    assert_eq!(records.len(), 5);
    for (index, record) in records.iter().enumerate() {
        assert_eq!(
            record,
            &vec![format!("a{index}"), format!("b{index}"), format!("c{index}")]
        );
    }
}

#[test]
fn report_filenames_are_sanitized() {
    assert_eq!(
        report_filename("MIS Report", Some("January 2026")),
        "MIS_Report_January_2026.pdf"
    );
    assert_eq!(
        report_filename("MIS Report.pdf", None),
        "MIS_Report.pdf"
    );
}

#[test]
fn mis_report_is_a_valid_pdf() {
    let options =
        ReportOptions::default().generated_at(time::macros::datetime!(2026-02-01 08:30 UTC));
    let report = mis_report(
        &MisReportData::sample("January 2026"),
        &options,
        &StandardFormatting,
    )
    .unwrap();
    assert_eq!(report.filename, "MIS_Report_January_2026.pdf");

    let parsed = lopdf::Document::load_mem(&report.bytes).unwrap();
    assert_eq!(parsed.get_pages().len(), report.page_count);

    let again = mis_report(
        &MisReportData::sample("January 2026"),
        &options,
        &StandardFormatting,
    )
    .unwrap();
    assert_eq!(report.bytes, again.bytes);
}

#[test]
fn json_document_renders_into_a_pdf() {
    let document: ReportDocument = serde_json::from_str(
        r#"{
            "config": { "title": "Liquidity Report", "period": "Q1 2026" },
            "sections": [
                { "type": "section-title", "title": "Balances" },
                { "type": "table", "columns": [
                    { "header": "Bank", "dataKey": "bank" },
                    { "header": "Balance", "dataKey": "balance" }
                ], "rows": [ { "bank": "Access", "balance": 1200.5 } ] },
                { "type": "signature-block" }
            ]
        }"#,
    )
    .unwrap();
    let mut builder = document.to_pdf(&ReportOptions::default()).unwrap();
    let bytes = builder.get_bytes().unwrap();

    let parsed = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(parsed.get_pages().len(), 1);
}

#[test]
fn custom_report_request_renders_from_json() {
    let request: CustomReportRequest = serde_json::from_str(
        r#"{
            "title": "Counterparty Exposure",
            "period": "Q1 2026",
            "summary": [ { "label": "Counterparties", "value": 2 } ],
            "tables": [ {
                "title": "Exposure",
                "columns": [ { "header": "Bank", "dataKey": "bank" } ],
                "rows": [ { "bank": "Access" }, { "bank": "UBA" } ]
            } ],
            "includeSignatures": true
        }"#,
    )
    .unwrap();
    let report = custom_report(&request, &ReportOptions::default()).unwrap();
    assert_eq!(report.filename, "Counterparty_Exposure_Q1_2026.pdf");

    let parsed = lopdf::Document::load_mem(&report.bytes).unwrap();
    assert_eq!(parsed.get_pages().len(), report.page_count);
}
