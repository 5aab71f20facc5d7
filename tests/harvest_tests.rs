//! End-to-end session tests against the scripted page

mod common;

use common::{item_text, item_texts, test_config, MockElement, MockPage, BUTTON};
use pretty_assertions::assert_eq;
use scroll_harvest::harvest::{ButtonDownload, HarvestSession, Termination};
use std::collections::HashSet;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_harvests_every_item_across_batches() {
    let page = MockPage::with_items(6);
    page.push_batch(item_texts(6..10));

    let mut session = HarvestSession::new(&page, test_config()).unwrap();
    let report = session.run().await;

    assert_eq!(report.termination, Termination::ContentExhausted);
    assert_eq!(report.items.len(), 10);
    assert_eq!(report.duplicates_skipped, 0);
    assert_eq!(report.extraction_failures, 0);

    let prompts: Vec<_> = report.items.iter().map(|i| i.metadata.prompt.clone()).collect();
    for (i, prompt) in prompts.iter().enumerate() {
        assert!(item_text(i).ends_with(prompt.as_str()), "item {i} out of order");
    }

    let fingerprints: HashSet<_> = report.items.iter().map(|i| &i.fingerprint).collect();
    assert_eq!(fingerprints.len(), 10);
    assert_eq!(report.navigation.processed, 10);
    assert_eq!(report.session_id, session.id());
}

#[tokio::test(start_paused = true)]
async fn test_preselected_first_item_is_harvested() {
    let page = MockPage::with_items(4);
    page.set_active(&[0]);

    let report = HarvestSession::new(&page, test_config()).unwrap().run().await;

    assert_eq!(report.termination, Termination::ContentExhausted);
    assert_eq!(report.items.len(), 4);
    assert!(item_text(0).ends_with(report.items[0].metadata.prompt.as_str()));
}

#[tokio::test(start_paused = true)]
async fn test_host_snapping_back_stops_session() {
    let page = MockPage::with_items(6);
    page.set_active(&[0]);
    page.set_snap_back(Some(0));

    let report = HarvestSession::new(&page, test_config()).unwrap().run().await;

    assert_eq!(report.termination, Termination::CycleDetected);
    assert_eq!(report.items.len(), 3);
    assert_eq!(report.navigation.cycles_detected, 1);
}

#[tokio::test(start_paused = true)]
async fn test_stops_at_max_items() {
    let page = MockPage::with_items(10);
    let mut config = test_config();
    config.limits.max_items = 3;

    let report = HarvestSession::new(&page, config).unwrap().run().await;

    assert_eq!(report.termination, Termination::MaxItems);
    assert_eq!(report.items.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_content_skipped() {
    let mut texts = item_texts(0..4);
    texts[2] = texts[1].clone();
    let page = MockPage::new(texts);

    let report = HarvestSession::new(&page, test_config()).unwrap().run().await;

    assert_eq!(report.items.len(), 3);
    assert_eq!(report.duplicates_skipped, 1);
    assert_eq!(report.navigation.duplicates_detected, 1);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_content_kept_when_configured() {
    let mut texts = item_texts(0..4);
    texts[2] = texts[1].clone();
    let page = MockPage::new(texts);
    let mut config = test_config();
    config.limits.skip_duplicates = false;

    let report = HarvestSession::new(&page, config).unwrap().run().await;

    assert_eq!(report.items.len(), 4);
    assert_eq!(report.duplicates_skipped, 1);
    assert_eq!(
        report.items[2].duplicate_of.as_ref(),
        Some(&report.items[1].fingerprint)
    );
    assert_eq!(report.items[1].duplicate_of, None);
}

#[tokio::test(start_paused = true)]
async fn test_landmark_fallback_and_extraction_failures() {
    let page = MockPage::new(vec![
        item_text(0),
        "Prompt\nan owl reading by candlelight\nCreation Time\nlast tuesday".to_string(),
        "just a picture of clouds".to_string(),
    ]);

    let report = HarvestSession::new(&page, test_config()).unwrap().run().await;

    assert_eq!(report.items.len(), 2);
    assert_eq!(report.extraction_failures, 1);
    assert_eq!(report.items[1].metadata.creation_time, "last tuesday");
    assert_eq!(report.items[1].metadata.prompt, "an owl reading by candlelight");
    // the failed item still counts as processed
    assert_eq!(report.navigation.processed, 3);
}

#[tokio::test(start_paused = true)]
async fn test_download_each_item() {
    let page = MockPage::with_items(4);
    page.add_button(BUTTON, false);

    let mut session = HarvestSession::new(&page, test_config())
        .unwrap()
        .with_download(ButtonDownload::new(BUTTON).ready_timeout(Duration::from_secs(1)));
    let report = session.run().await;

    assert_eq!(report.items.len(), 4);
    assert_eq!(report.downloads.attempted, 4);
    assert_eq!(report.downloads.succeeded, 4);
    assert_eq!(page.button_clicks(BUTTON), 4);
    assert!(report.items.iter().all(|i| i.download.as_ref().is_some_and(|d| d.success)));
    assert_eq!(page.hovers()[0], MockElement::Item(0));
}

#[tokio::test(start_paused = true)]
async fn test_download_failure_still_records_item() {
    let page = MockPage::with_items(2);
    page.add_button(BUTTON, true);

    let mut session = HarvestSession::new(&page, test_config())
        .unwrap()
        .with_download(ButtonDownload::new(BUTTON).ready_timeout(Duration::from_millis(300)));
    let report = session.run().await;

    assert_eq!(report.items.len(), 2);
    assert_eq!(report.downloads.attempted, 2);
    assert_eq!(report.downloads.succeeded, 0);
    assert_eq!(page.button_clicks(BUTTON), 0);
    let outcome = report.items[0].download.as_ref().unwrap();
    assert!(!outcome.success);
    assert!(outcome.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_page_terminates() {
    let page = MockPage::with_items(3);
    page.set_fail_queries(true);

    let report = HarvestSession::new(&page, test_config()).unwrap().run().await;

    assert_eq!(report.termination, Termination::PageUnavailable);
    assert!(report.items.is_empty());
    assert!(report.last_error.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_report_serializes() {
    let page = MockPage::with_items(2);
    let report = HarvestSession::new(&page, test_config()).unwrap().run().await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["termination"], "content_exhausted");
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["items"][0]["metadata"]["creation_time"], "25 Aug 2025 00:00:00");
    assert!(json["scroll"]["strategies"].is_array());
    assert!(json["wait"]["operations"].is_object());
}
