use onboardbase::schema::fields::{AGE_MAX, AGE_MIN, BRAND_TONE, PLATFORMS};
use onboardbase::schema::FieldValue;
use onboardbase::validation::{REVIEW_STEP, STEP_COUNT};
use onboardbase::wizard::{NextOutcome, StepError};
use std::time::{Duration, Instant};

use crate::support::wizard_fixture::{fill_step, walk_to_review, BrowserFixture};

#[test]
fn full_walk_reaches_review_and_confirms() {
    let browser = BrowserFixture::new();
    let mut machine = browser.machine();
    walk_to_review(&mut machine);

    assert_eq!(machine.current_step(), REVIEW_STEP);
    assert_eq!(machine.completed_steps().len(), REVIEW_STEP);
    assert_eq!(machine.next(), Ok(NextOutcome::ReadyToSubmit));
    assert_eq!(machine.current_step(), REVIEW_STEP);
}

#[test]
fn out_of_order_filling_marks_later_steps_complete() {
    let browser = BrowserFixture::new();
    let mut machine = browser.machine();
    let start = Instant::now();
    machine
        .set_field_at(PLATFORMS, FieldValue::set(["TikTok"]), start)
        .unwrap();
    machine
        .set_field_at(BRAND_TONE, FieldValue::text("Playful"), start)
        .unwrap();

    assert!(machine.poll(start + Duration::from_millis(300)));
    assert!(machine.completed_steps().contains(&3));
    assert!(machine.completed_steps().contains(&4));
    assert!(!machine.completed_steps().contains(&0));

    assert_eq!(machine.go_to(4), Ok(4));
    assert_eq!(machine.go_to(5), Ok(5));
    assert_eq!(machine.go_to(7), Err(StepError::Locked { target: 7 }));
}

#[test]
fn go_to_zero_is_always_allowed() {
    let browser = BrowserFixture::new();
    let mut machine = browser.machine();
    assert_eq!(machine.go_to(0), Ok(0));

    walk_to_review(&mut machine);
    assert_eq!(machine.go_to(0), Ok(0));
    assert_eq!(machine.go_to(REVIEW_STEP), Ok(REVIEW_STEP));
    assert_eq!(
        machine.go_to(STEP_COUNT + 3),
        Err(StepError::OutOfRange { target: STEP_COUNT + 3 })
    );
}

#[test]
fn failed_validation_leaves_state_untouched() {
    let browser = BrowserFixture::new();
    let mut machine = browser.machine();
    fill_step(&mut machine, 0);
    machine.next().unwrap();
    assert_eq!(machine.next(), Ok(NextOutcome::Advanced(2)));

    let before = machine.snapshot();
    match machine.next() {
        Err(StepError::Incomplete { step, missing }) => {
            assert_eq!(step, 2);
            assert_eq!(missing, vec!["primary_goals".to_string()]);
        }
        other => panic!("expected incomplete step 2, got {other:?}"),
    }
    assert_eq!(machine.snapshot(), before);
}

#[test]
fn inverted_age_range_blocks_the_audience_step() {
    let browser = BrowserFixture::new();
    let mut machine = browser.machine();
    fill_step(&mut machine, 0);
    machine.next().unwrap();
    machine.set_field(AGE_MIN, FieldValue::Number(60)).unwrap();
    machine.set_field(AGE_MAX, FieldValue::Number(30)).unwrap();

    let error = machine.next().unwrap_err();
    assert!(error.is_validation_failure());
    let status = machine.step_status(1);
    assert!(!status.valid);
    assert!(status.touched);
    assert!(status.has_data, "an inverted range is still data");
}

#[test]
fn default_audience_step_counts_as_data_once_anything_is_edited() {
    let browser = BrowserFixture::new();
    let mut machine = browser.machine();
    let status = machine.step_status(1);
    assert!(status.valid);
    assert!(status.has_data);
    assert!(machine.completed_steps().is_empty());

    let start = Instant::now();
    machine
        .set_field_at(BRAND_TONE, FieldValue::text("Playful"), start)
        .unwrap();
    assert!(machine.poll(start + Duration::from_millis(300)));
    assert!(machine.completed_steps().contains(&1));
}

#[test]
fn previous_from_first_step_is_a_no_op() {
    let browser = BrowserFixture::new();
    let mut machine = browser.machine();
    assert_eq!(machine.previous(), 0);
    assert!(browser.durable.is_empty());
}
