use anyhow::Result;
use onboardbase::persistence::{ExternalSignal, FileTier, MemoryTier, PersistenceLayer, WizardMode};
use onboardbase::schema::fields::{BRAND_TONE, BUSINESS_NAME};
use onboardbase::schema::FieldValue;
use onboardbase::services::OnboardingSession;
use onboardbase::wizard::{SyncOutcome, WizardMachine};
use onboardbase::OnboardingType;
use std::sync::Arc;
use tempfile::TempDir;

use crate::support::fakes::FakeProfile;
use crate::support::wizard_fixture::{fill_step, BrowserFixture};

#[test]
fn second_tab_adopts_progress_from_the_first() {
    let browser = BrowserFixture::new();
    let mut first = browser.machine();
    let mut second = browser.machine();
    let mut second_events = second.persistence().subscribe().expect("bus attached");
    let mut first_events = first.persistence().subscribe().expect("bus attached");

    fill_step(&mut first, 0);
    first.next().unwrap();

    let signal = second_events.drain().expect("foreign write observed");
    assert_eq!(second.handle_signal(&signal), SyncOutcome::Adopted);
    assert_eq!(second.current_step(), 1);
    assert_eq!(second.form().text(BUSINESS_NAME), "Acme Bakery");
    assert!(second.completed_steps().contains(&0));

    assert!(second_events.drain().is_none());
    assert!(
        first_events.drain().is_none(),
        "adopting must not echo writes back"
    );
}

#[test]
fn reset_in_one_tab_clears_the_other() {
    let browser = BrowserFixture::new();
    let mut first = browser.machine();
    let mut second = browser.machine();
    let mut first_events = first.persistence().subscribe().expect("bus attached");

    fill_step(&mut first, 0);
    first.next().unwrap();
    second.handle_signal(&ExternalSignal::WindowFocused);
    assert_eq!(second.current_step(), 1);

    second.reset();
    let signal = first_events.drain().expect("reset observed");
    assert_eq!(first.handle_signal(&signal), SyncOutcome::Cleared);
    assert_eq!(first.current_step(), 0);
    assert!(first.completed_steps().is_empty());
}

#[test]
fn focus_recheck_adopts_without_a_bus() {
    let durable = MemoryTier::new();
    let tab = |durable: &MemoryTier| {
        PersistenceLayer::new(
            Arc::new(durable.clone()),
            Arc::new(MemoryTier::new()),
            BrowserFixture::new().keys(),
            WizardMode::Create,
        )
    };
    let config = BrowserFixture::new().config;
    let mut writer = WizardMachine::new(tab(&durable), &config);
    let mut reader = WizardMachine::new(tab(&durable), &config);
    assert!(reader.persistence().subscribe().is_none());

    writer
        .set_field(BRAND_TONE, FieldValue::text("Bold"))
        .unwrap();
    assert_eq!(
        reader.handle_signal(&ExternalSignal::VisibilityRegained),
        SyncOutcome::Adopted
    );
    assert_eq!(reader.form().text(BRAND_TONE), "Bold");
    assert_eq!(
        reader.handle_signal(&ExternalSignal::WindowFocused),
        SyncOutcome::Unchanged
    );
}

#[test]
fn edit_mode_ignores_storage_events() {
    let browser = BrowserFixture::new();
    let mut writer = browser.machine();
    let mut editor = WizardMachine::from_profile(
        browser.tab_in(WizardMode::Edit),
        &browser.config,
        &serde_json::Map::new(),
    );
    fill_step(&mut writer, 0);
    assert_eq!(
        editor.handle_signal(&ExternalSignal::StorageChanged { key: None }),
        SyncOutcome::Ignored
    );
    assert!(!editor.form().is_filled(BUSINESS_NAME));
}

#[tokio::test]
async fn session_sync_picks_up_selection_changes() -> Result<()> {
    let browser = BrowserFixture::new();
    let mut first = OnboardingSession::start(
        Arc::new(FakeProfile::missing()),
        browser.tab(),
        browser.config.clone(),
    )
    .await?;
    let mut second = OnboardingSession::start(
        Arc::new(FakeProfile::missing()),
        browser.tab(),
        browser.config.clone(),
    )
    .await?;
    assert_eq!(second.sync(), SyncOutcome::Unchanged);

    first.select_type(OnboardingType::Creator)?;
    second.sync();
    assert_eq!(
        second.selection().map(|selection| selection.onboarding_type),
        Some(OnboardingType::Creator)
    );

    first.change_selection();
    second.sync();
    assert!(second.needs_selection());
    Ok(())
}

#[test]
fn file_backed_progress_survives_restart() {
    let tmp = TempDir::new().expect("temp dir");
    let durable_dir = tmp.path().join("storage").join("durable");
    let config = BrowserFixture::new().config;
    let tab = || {
        PersistenceLayer::new(
            Arc::new(FileTier::new(&durable_dir)),
            Arc::new(MemoryTier::new()),
            BrowserFixture::new().keys(),
            WizardMode::Create,
        )
    };
    {
        let mut machine = WizardMachine::new(tab(), &config);
        fill_step(&mut machine, 0);
        machine.next().unwrap();
    }
    assert!(durable_dir.join("onboarding_form_data.json").exists());

    let restored = WizardMachine::new(tab(), &config);
    assert_eq!(restored.current_step(), 1);
    assert_eq!(restored.form().text(BUSINESS_NAME), "Acme Bakery");
}
