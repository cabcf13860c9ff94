use anyhow::Result;
use onboardbase::schema::fields::{
    AGE_MAX, AGE_MIN, BRAND_COLORS, BUSINESS_DESCRIPTION, BUSINESS_NAME, ENRICHMENT_PLACE_ID,
    ENRICHMENT_SOURCE, GENDER, INDUSTRY, PLATFORMS, PRIMARY_GOALS,
};
use onboardbase::schema::FieldValue;
use onboardbase::services::{
    ApiError, AutofillOutcome, AutofillStatus, DocumentApi, DocumentUpload, EnrichmentSource,
    LookupRequest, LookupResponse, OnboardingSession, SearchApi, SEARCH_STAGES,
};
use onboardbase::OnboardingType;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::support::fakes::{FakeDocuments, FakeMedia, FakeProfile, FakeSearch};
use crate::support::wizard_fixture::BrowserFixture;

async fn session(browser: &BrowserFixture) -> Result<OnboardingSession> {
    OnboardingSession::start(
        Arc::new(FakeProfile::missing()),
        browser.tab(),
        browser.config.clone(),
    )
    .await
}

fn lookup_request() -> LookupRequest {
    LookupRequest {
        query: "Acme Bakery".into(),
        kind: OnboardingType::Business,
        place_id: Some("ChIJ42".into()),
    }
}

#[tokio::test]
async fn document_enrichment_fills_gaps_only() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut session = session(&browser).await?;
    session
        .machine_mut()
        .set_field(BUSINESS_NAME, FieldValue::text("Acme Bakery"))?;

    let documents = FakeDocuments {
        payload: Ok(json!({
            "step_0": {
                "business_name": "ACME BAKERY LTD",
                "business_description": "Sourdough and pastries",
                "industry": ["food & beverage", "Quantum Computing"]
            },
            "step_1": {
                "age_groups": ["Young Professionals (25–35)", "Teens (13–19)"],
                "gender": ["Women"]
            },
            "goals": ["Increase Sales", "Increase Sales"],
            "social_media": ["instagram.com/acme", "x.com/acme"]
        })),
    };
    let upload = DocumentUpload::new("brand-brief.pdf", b"%PDF-1.7".to_vec());
    let outcome = session.autofill_from_document(&documents, &upload).await;

    let report = outcome.report().expect("merged");
    assert_eq!(report.dropped, vec!["Quantum Computing".to_string()]);
    let form = session.machine().form();
    assert_eq!(form.text(BUSINESS_NAME), "Acme Bakery");
    assert_eq!(form.text(BUSINESS_DESCRIPTION), "Sourdough and pastries");
    assert_eq!(form.items(INDUSTRY), ["Food & Beverage".to_string()]);
    assert_eq!(form.number(AGE_MIN), Some(16));
    assert_eq!(form.number(AGE_MAX), Some(35));
    assert_eq!(form.text(GENDER), "women");
    assert_eq!(form.items(PRIMARY_GOALS), ["Increase Sales".to_string()]);
    assert_eq!(
        form.items(PLATFORMS),
        ["Instagram".to_string(), "Twitter".to_string()]
    );
    assert_eq!(form.text(ENRICHMENT_SOURCE), "document");

    let completed = session.machine().completed_steps();
    for step in [0, 1, 2, 4] {
        assert!(completed.contains(&step), "step {step} should be complete");
    }
    assert_eq!(
        session.autofill().status(EnrichmentSource::Document),
        AutofillStatus::Applied {
            fields: report.changed.len()
        }
    );
    Ok(())
}

#[tokio::test]
async fn unsupported_document_fails_without_touching_the_form() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut session = session(&browser).await?;
    let before = session.machine().snapshot();
    let documents = FakeDocuments {
        payload: Ok(json!({"business_name": "Never used"})),
    };
    let upload = DocumentUpload::new("logo.png", Vec::new());

    let outcome = session.autofill_from_document(&documents, &upload).await;
    assert!(matches!(outcome, AutofillOutcome::Failed(ApiError::Rejected(_))));
    assert_eq!(session.machine().snapshot(), before);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn lookup_shows_progress_until_it_resolves() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut session = session(&browser).await?;
    let search = FakeSearch::found(
        json!({"name": "Acme Bakery", "category": "Retail"}),
        Duration::from_secs(4),
    );
    let mut progress = session.lookup_progress();
    let request = lookup_request();

    let observe = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let first = *progress.borrow_and_update();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let second = *progress.borrow_and_update();
        (first, second)
    };
    let (outcome, (first, second)) =
        tokio::join!(session.autofill_from_lookup(&search, &request), observe);

    assert_eq!(first, Some(SEARCH_STAGES[0]));
    assert_eq!(second, Some(SEARCH_STAGES[1]));
    assert!(matches!(outcome, AutofillOutcome::Applied(_)));
    assert_eq!(*progress.borrow(), None);
    assert_eq!(session.machine().form().text(ENRICHMENT_PLACE_ID), "ChIJ42");
    assert_eq!(session.machine().form().items(INDUSTRY), ["Retail".to_string()]);
    Ok(())
}

#[tokio::test]
async fn unsuccessful_lookup_surfaces_an_inline_error() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut session = session(&browser).await?;
    let search = FakeSearch::responding(
        LookupResponse {
            success: false,
            data: json!({"name": "Wrong Bakery"}),
            error: Some("business not found".into()),
        },
        Duration::ZERO,
    );

    let outcome = session.autofill_from_lookup(&search, &lookup_request()).await;
    assert!(matches!(outcome, AutofillOutcome::Failed(_)));
    assert!(!session.machine().form().is_filled(BUSINESS_NAME));
    let status = session.autofill().status(EnrichmentSource::SmartSearch);
    assert_eq!(
        status.message().as_deref(),
        Some("Autofill failed: request rejected: business not found")
    );
    Ok(())
}

#[tokio::test]
async fn logo_colors_are_unioned_into_brand_colors() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut session = session(&browser).await?;
    session
        .machine_mut()
        .set_field(BRAND_COLORS, FieldValue::set(["#112233"]))?;
    let media = FakeMedia {
        colors: vec!["#112233".into(), "#FFEEDD".into()],
    };

    session
        .autofill_from_logo(&media, "https://cdn.example.com/logo.png")
        .await;
    assert_eq!(
        session.machine().form().items(BRAND_COLORS),
        ["#112233".to_string(), "#FFEEDD".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn results_after_teardown_are_discarded() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut session = session(&browser).await?;
    session.teardown();
    let documents = FakeDocuments {
        payload: Ok(json!({"business_name": "Acme Bakery"})),
    };
    let upload = DocumentUpload::new("brief.txt", b"Acme Bakery".to_vec());

    let outcome = session.autofill_from_document(&documents, &upload).await;
    assert_eq!(outcome, AutofillOutcome::Discarded);
    assert!(!session.machine().form().is_filled(BUSINESS_NAME));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn timed_out_lookup_returns_the_source_to_idle() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut session = session(&browser).await?;
    let search = FakeSearch::found(json!({"name": "Acme Bakery"}), Duration::from_secs(10));
    let progress = session.lookup_progress();
    let request = lookup_request();

    let attempt = tokio::time::timeout(
        Duration::from_secs(1),
        session.autofill_from_lookup(&search, &request),
    )
    .await;
    assert!(attempt.is_err());

    tokio::time::sleep(Duration::from_secs(60)).await;
    let status = session.autofill().status(EnrichmentSource::SmartSearch);
    assert_eq!(status, AutofillStatus::Idle);
    assert_eq!(status.message(), None);
    assert_eq!(*progress.borrow(), None);
    assert!(!session.machine().form().is_filled(BUSINESS_NAME));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn teardown_discards_a_lookup_still_in_flight() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut session = session(&browser).await?;
    let search: Arc<dyn SearchApi> = Arc::new(FakeSearch::found(
        json!({"name": "Acme Bakery"}),
        Duration::from_secs(3),
    ));

    let pending = session.request_lookup(search, lookup_request());
    assert_eq!(
        session.autofill().status(EnrichmentSource::SmartSearch),
        AutofillStatus::Running
    );
    session.teardown();

    let outcome = session.finish_autofill(pending).await;
    assert_eq!(outcome, AutofillOutcome::Discarded);
    assert!(!session.machine().form().is_filled(BUSINESS_NAME));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn superseded_lookup_merges_without_owning_the_status() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut session = session(&browser).await?;
    let slow: Arc<dyn SearchApi> = Arc::new(FakeSearch::found(
        json!({"name": "Acme Old Town", "goals": ["Brand Awareness"]}),
        Duration::from_secs(5),
    ));
    let fast: Arc<dyn SearchApi> = Arc::new(FakeSearch::found(
        json!({"name": "Acme Bakery"}),
        Duration::from_secs(1),
    ));

    let first = session.request_lookup(slow, lookup_request());
    let second = session.request_lookup(fast, lookup_request());

    let latest = session.finish_autofill(second).await;
    assert!(matches!(latest, AutofillOutcome::Applied(_)));
    let stale = session.finish_autofill(first).await;
    assert!(matches!(stale, AutofillOutcome::AppliedStale(_)));

    let form = session.machine().form();
    assert_eq!(form.text(BUSINESS_NAME), "Acme Bakery");
    assert_eq!(form.items(PRIMARY_GOALS), ["Brand Awareness".to_string()]);
    assert_eq!(
        session.autofill().status(EnrichmentSource::SmartSearch),
        AutofillStatus::Applied { fields: 3 }
    );
    Ok(())
}

#[tokio::test]
async fn cancelled_document_request_leaves_the_source_idle() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut session = session(&browser).await?;
    let documents: Arc<dyn DocumentApi> = Arc::new(FakeDocuments {
        payload: Ok(json!({"business_name": "Acme Bakery"})),
    });

    let pending = session.request_document(documents, DocumentUpload::new("brief.pdf", Vec::new()));
    session.cancel_autofill(pending);
    assert_eq!(
        session.autofill().status(EnrichmentSource::Document),
        AutofillStatus::Idle
    );
    assert!(!session.machine().form().is_filled(BUSINESS_NAME));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn teardown_stops_pending_autocomplete() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut session = session(&browser).await?;
    let search = Arc::new(FakeSearch::found(json!({}), Duration::ZERO));
    let api: Arc<dyn SearchApi> = search.clone();
    let predictions = session.attach_autocomplete(api);

    assert!(session.autocomplete_input("acme bak"));
    session.teardown();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(search.autocomplete_calls().is_empty());
    assert!(predictions.borrow().items.is_empty());
    assert!(!session.autocomplete_input("acme bakery "));
    Ok(())
}
