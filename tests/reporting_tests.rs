//! Reporting over tables written by the ingestion pipeline

mod common;

use chrono::Duration;
use dental_leads_lib::application::{IngestionRequest, ReportingView};
use dental_leads_lib::domain::lead::header_row;
use dental_leads_lib::domain::repositories::TableBackend;

use common::{DIRECTORY_A, StaticFetcher, StaticSearch, directory_a_page, harness, today};

#[tokio::test]
async fn report_counts_ingested_and_legacy_rows() {
    let fetcher = StaticFetcher::default().with_page(
        DIRECTORY_A,
        &directory_a_page(&[("Smile Dental", "https://smile.pk"), ("Pearl Clinic", "https://pearl.pk")]),
    );
    let h = harness(fetcher, StaticSearch::default()).await;
    let request = IngestionRequest::new("sheet_1", "Lahore", 5, "directories").unwrap();
    h.pipeline.run_on(&request, today()).await.unwrap();

    let row = |name: &str, date: chrono::NaiveDate| {
        let mut cells: Vec<String> = vec![String::new(); 8];
        cells[0] = name.to_string();
        cells[1] = "Karachi".to_string();
        cells[7] = date.format("%Y-%m-%d").to_string();
        cells
    };
    h.backend.create_table("Karachi", &header_row()).await.unwrap();
    h.backend
        .append_rows(
            "Karachi",
            &[
                row("Seven Days", today() - Duration::days(7)),
                row("Eight Days", today() - Duration::days(8)),
                vec!["No Date".to_string()],
            ],
        )
        .await
        .unwrap();

    let report = ReportingView::new(h.backend.clone()).generate(today()).await.unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.added_today, 2);
    assert_eq!(report.added_last_7_days, 3);
    assert_eq!(report.per_city["Lahore"], 2);
    assert_eq!(report.per_city["Karachi"], 2);
    assert_eq!(report.skipped_rows, 1);
    assert_eq!(report.log.first().map(|e| e.date_added), Some(today()));
    assert_eq!(report.log.last().map(|e| e.clinic_name.as_str()), Some("Eight Days"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["total"], 4);
    assert_eq!(json["per_city"]["Lahore"], 2);
}

#[tokio::test]
async fn empty_spreadsheet_reports_zeroes() {
    let h = harness(StaticFetcher::default(), StaticSearch::default()).await;
    let report = ReportingView::new(h.backend.clone()).generate(today()).await.unwrap();

    assert_eq!(report.total, 0);
    assert!(report.per_city.is_empty());
    assert!(report.log.is_empty());
}
