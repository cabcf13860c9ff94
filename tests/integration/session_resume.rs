use anyhow::Result;
use onboardbase::persistence::{OnboardingType, Selection, StorageTier};
use onboardbase::schema::fields::BUSINESS_NAME;
use onboardbase::services::OnboardingSession;
use serde_json::json;
use std::sync::Arc;

use crate::support::fakes::FakeProfile;
use crate::support::wizard_fixture::{fill_step, BrowserFixture};

#[tokio::test]
async fn fresh_session_starts_empty() -> Result<()> {
    let browser = BrowserFixture::new();
    let session = OnboardingSession::start(
        Arc::new(FakeProfile::missing()),
        browser.tab(),
        browser.config.clone(),
    )
    .await?;

    assert!(session.needs_selection());
    assert_eq!(session.machine().current_step(), 0);
    assert!(session.machine().completed_steps().is_empty());
    assert!(browser.durable.is_empty());
    Ok(())
}

#[tokio::test]
async fn durable_selection_is_adopted_without_session_flags() -> Result<()> {
    let browser = BrowserFixture::new();
    let keys = browser.keys();
    browser.durable.set(&keys.selected_type, "business")?;
    browser.durable.set(&keys.type_selected, "true")?;

    let session = OnboardingSession::start(
        Arc::new(FakeProfile::missing()),
        browser.tab(),
        browser.config.clone(),
    )
    .await?;

    let selection = session.selection().expect("selection adopted");
    assert_eq!(selection.onboarding_type, OnboardingType::Business);
    assert!(selection.confirmed);
    assert!(!session.needs_selection());
    Ok(())
}

#[tokio::test]
async fn server_not_completed_clears_stale_local_state() -> Result<()> {
    let browser = BrowserFixture::new();
    {
        let mut machine = browser.machine();
        fill_step(&mut machine, 0);
        machine.next().expect("step 0 valid");
        browser
            .tab()
            .write_selection(Selection::confirmed(OnboardingType::Creator))?;
    }
    assert!(!browser.durable.is_empty());

    let session = OnboardingSession::start(
        Arc::new(FakeProfile::not_completed()),
        browser.tab(),
        browser.config.clone(),
    )
    .await?;

    assert!(session.needs_selection());
    assert_eq!(session.machine().current_step(), 0);
    assert!(!session.machine().form().is_filled(BUSINESS_NAME));
    assert!(browser.durable.is_empty());
    Ok(())
}

#[tokio::test]
async fn completed_profile_supplies_type_when_nothing_is_local() -> Result<()> {
    let browser = BrowserFixture::new();
    let profile = FakeProfile::with_record(json!({
        "onboarding_completed": true,
        "onboarding_type": "creator"
    }));
    let session =
        OnboardingSession::start(Arc::new(profile), browser.tab(), browser.config.clone()).await?;

    assert_eq!(
        session.selection().map(|selection| selection.onboarding_type),
        Some(OnboardingType::Creator)
    );
    assert_eq!(
        browser.durable_value(&browser.keys().selected_type).as_deref(),
        Some("creator")
    );
    Ok(())
}

#[tokio::test]
async fn saved_progress_survives_a_reload() -> Result<()> {
    let browser = BrowserFixture::new();
    {
        let mut machine = browser.machine();
        fill_step(&mut machine, 0);
        machine.next().expect("step 0 valid");
        fill_step(&mut machine, 1);
        machine.next().expect("step 1 valid");
    }

    let session = OnboardingSession::start(
        Arc::new(FakeProfile::missing()),
        browser.tab(),
        browser.config.clone(),
    )
    .await?;
    let machine = session.machine();
    assert_eq!(machine.current_step(), 2);
    assert!(machine.completed_steps().contains(&0));
    assert!(machine.completed_steps().contains(&1));
    assert_eq!(machine.form().text(BUSINESS_NAME), "Acme Bakery");
    Ok(())
}

#[tokio::test]
async fn corrupt_storage_is_treated_as_no_session() -> Result<()> {
    let browser = BrowserFixture::new();
    let keys = browser.keys();
    browser.durable.set(&keys.form_data, "{not json")?;
    browser.durable.set(&keys.current_step, "4")?;
    browser.durable.set(&keys.selected_type, "spaceship")?;

    let session = OnboardingSession::start(
        Arc::new(FakeProfile::missing()),
        browser.tab(),
        browser.config.clone(),
    )
    .await?;
    assert_eq!(session.machine().current_step(), 0);
    assert!(session.needs_selection());
    Ok(())
}
