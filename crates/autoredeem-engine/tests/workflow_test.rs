mod common;

use autoredeem_engine::money::Amount;
use autoredeem_engine::strategies;
use autoredeem_engine::workflow::{
    BalanceReport, CompletionReason, Credentials, FailureReason, TransferState,
    TransferWorkflow, WorkflowError,
};
use common::{
    CONFIRM_URL, Effect, FakeElement, FakeSite, LOGIN_URL, PAYOUT_URL, file_names, first_query,
    login_walled_site, payout_site, test_config,
};
use tempfile::tempdir;

fn credentials() -> Option<Credentials> {
    Some(Credentials::new("seller@example.com", "s3cret"))
}

fn has_screenshot(names: &[String], tag: &str) -> bool {
    names
        .iter()
        .any(|n| n.starts_with("screenshot_") && n.ends_with(&format!("_{}.png", tag)))
}

#[tokio::test]
async fn balance_above_threshold_initiates_transfer() {
    let dir = tempdir().expect("tempdir");
    let mut site = payout_site("$12.00");
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Completed(CompletionReason::TransferInitiated)
    );
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.balance, Some(Amount::from_cents(1200)));
    assert_eq!(
        outcome.history,
        vec![
            TransferState::Idle,
            TransferState::Navigating,
            TransferState::CheckingBalance,
            TransferState::SelectingPayoutMethod,
            TransferState::AwaitingContinue,
            TransferState::ConfirmingRedeem,
            TransferState::Redeeming,
            TransferState::Completed(CompletionReason::TransferInitiated),
        ]
    );
    assert_eq!(site.current_scene(), Some("done"));

    let names = file_names(dir.path());
    assert!(has_screenshot(&names, "payout_options_page"));
    assert!(has_screenshot(&names, "confirmation_page"));
    assert!(has_screenshot(&names, "transfer_completed"));
    assert_eq!(outcome.screenshots.len(), 3);
}

#[tokio::test]
async fn balance_below_threshold_never_touches_payout_controls() {
    let dir = tempdir().expect("tempdir");
    let mut site = payout_site("$2.00");
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Completed(CompletionReason::NoActionNeeded)
    );
    assert_eq!(outcome.exit_code(), 0);
    let payout_queries: Vec<_> = strategies::payout_method()
        .into_iter()
        .map(|s| s.query)
        .collect();
    assert!(!site.located_any(&payout_queries));
    assert!(site.clicked.is_empty());
    assert!(has_screenshot(
        &file_names(dir.path()),
        "balance_below_threshold"
    ));
}

#[tokio::test]
async fn unparsed_balance_falls_back_to_the_sentinel() {
    let dir = tempdir().expect("tempdir");
    let mut site = payout_site("(balance unavailable)");
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(outcome.balance, Some(Amount::from_cents(1)));
    assert_eq!(
        outcome.state,
        TransferState::Completed(CompletionReason::NoActionNeeded)
    );
}

#[tokio::test]
async fn threshold_is_inclusive() {
    let dir = tempdir().expect("tempdir");
    let mut site = payout_site("$5.00");
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");
    assert_eq!(
        outcome.state,
        TransferState::Completed(CompletionReason::TransferInitiated)
    );
}

#[tokio::test]
async fn login_wall_without_credentials_fails_with_code_2() {
    let dir = tempdir().expect("tempdir");
    let mut site = login_walled_site("$12.00");
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Failed(FailureReason::MissingCredentials)
    );
    assert_eq!(outcome.exit_code(), 2);
    assert!(site.filled.is_empty());
    assert!(has_screenshot(&file_names(dir.path()), "login_required"));
}

#[tokio::test]
async fn login_wall_with_credentials_logs_in_and_continues() {
    let dir = tempdir().expect("tempdir");
    let mut site = login_walled_site("$12.00");
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), credentials());

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Completed(CompletionReason::TransferInitiated)
    );
    assert_eq!(outcome.history[2], TransferState::LoggingIn);
    let filled: Vec<&str> = site.filled.iter().map(|(_, v)| v.as_str()).collect();
    assert_eq!(filled, vec!["seller@example.com", "s3cret"]);
    assert_eq!(site.navigations, vec![PAYOUT_URL, PAYOUT_URL]);
}

#[tokio::test]
async fn missing_login_button_is_a_login_error() {
    let dir = tempdir().expect("tempdir");
    let mut site = payout_site("$12.00")
        .scene("login", LOGIN_URL, "Log in")
        .route(PAYOUT_URL, "login")
        .element(
            "login",
            FakeElement::new(first_query(&strategies::login_email())),
        )
        .element(
            "login",
            FakeElement::new(first_query(&strategies::login_password())),
        );
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), credentials());

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(outcome.state, TransferState::Failed(FailureReason::LoginError));
    assert_eq!(outcome.exit_code(), 3);
    assert!(has_screenshot(&file_names(dir.path()), "login_failed"));
}

#[tokio::test]
async fn rejected_login_is_a_login_error_not_a_quiet_success() {
    let dir = tempdir().expect("tempdir");
    // Submitting does nothing: the payout URL keeps redirecting to the form.
    let mut site = payout_site("$12.00")
        .scene("login", LOGIN_URL, "Log in to Poshmark. Incorrect password.")
        .route(PAYOUT_URL, "login")
        .element(
            "login",
            FakeElement::new(first_query(&strategies::login_email())),
        )
        .element(
            "login",
            FakeElement::new(first_query(&strategies::login_password())),
        )
        .element(
            "login",
            FakeElement::new(first_query(&strategies::login_submit())),
        );
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), credentials());

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(outcome.state, TransferState::Failed(FailureReason::LoginError));
    assert_eq!(outcome.exit_code(), 3);
    assert!(!outcome.history.contains(&TransferState::CheckingBalance));
    assert_eq!(outcome.balance, None);
    assert_eq!(site.navigations, vec![PAYOUT_URL, PAYOUT_URL]);
    assert!(has_screenshot(&file_names(dir.path()), "login_failed"));
}

#[tokio::test]
async fn security_challenge_stops_before_the_balance_check() {
    let dir = tempdir().expect("tempdir");
    let mut site = FakeSite::new()
        .scene(
            "payout",
            PAYOUT_URL,
            "Please complete the Security Check to continue. $12.00",
        )
        .route(PAYOUT_URL, "payout");
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Failed(FailureReason::SecurityChallenge)
    );
    assert_eq!(outcome.exit_code(), 4);
    assert!(outcome.history.contains(&TransferState::SecurityChallenge));
    assert!(!outcome.history.contains(&TransferState::CheckingBalance));
    assert_eq!(outcome.balance, None);
    assert!(has_screenshot(&file_names(dir.path()), "security_challenge"));
}

#[tokio::test]
async fn missing_payout_method_fails_with_code_5() {
    let dir = tempdir().expect("tempdir");
    let mut site = FakeSite::new()
        .scene("payout", PAYOUT_URL, "Redeemable $12.00")
        .route(PAYOUT_URL, "payout");
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Failed(FailureReason::MethodNotFound)
    );
    assert_eq!(outcome.exit_code(), 5);
    assert!(has_screenshot(
        &file_names(dir.path()),
        "direct_deposit_not_found"
    ));
}

#[tokio::test]
async fn hidden_radio_is_selected_by_force() {
    let dir = tempdir().expect("tempdir");
    let table = strategies::payout_method();
    let mut site = FakeSite::new()
        .scene("payout", PAYOUT_URL, "Redeemable $12.00")
        .scene("confirm", CONFIRM_URL, "Confirm Redeem")
        .route(PAYOUT_URL, "payout")
        .element("payout", FakeElement::new(table[0].query.clone()).hidden())
        .element("payout", FakeElement::new(table[3].query.clone()).hidden())
        .element(
            "payout",
            FakeElement::new(first_query(&strategies::continue_button()))
                .on_click(Effect::Goto("confirm")),
        )
        .element(
            "confirm",
            FakeElement::new(first_query(&strategies::redeem_button())),
        );
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Completed(CompletionReason::TransferInitiated)
    );
    assert_eq!(site.clicked[0], table[3].query);
}

#[tokio::test]
async fn missing_continue_button_fails_with_code_6() {
    let dir = tempdir().expect("tempdir");
    let mut site = FakeSite::new()
        .scene("payout", PAYOUT_URL, "Redeemable $12.00")
        .route(PAYOUT_URL, "payout")
        .element(
            "payout",
            FakeElement::new(first_query(&strategies::payout_method())),
        );
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Failed(FailureReason::ContinueNotFound)
    );
    assert_eq!(outcome.exit_code(), 6);
    assert!(has_screenshot(
        &file_names(dir.path()),
        "continue_button_not_found"
    ));
}

#[tokio::test]
async fn missing_redeem_button_fails_with_code_7() {
    let dir = tempdir().expect("tempdir");
    let mut site = FakeSite::new()
        .scene("payout", PAYOUT_URL, "Redeemable $12.00")
        .scene("confirm", CONFIRM_URL, "Confirm Redeem")
        .route(PAYOUT_URL, "payout")
        .element(
            "payout",
            FakeElement::new(first_query(&strategies::payout_method())),
        )
        .element(
            "payout",
            FakeElement::new(first_query(&strategies::continue_button()))
                .on_click(Effect::Goto("confirm")),
        );
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Failed(FailureReason::RedeemNotFound)
    );
    assert_eq!(outcome.exit_code(), 7);
    assert!(has_screenshot(
        &file_names(dir.path()),
        "redeem_button_not_found"
    ));
}

/// Continue lands on a page that looks nothing like the confirmation page.
fn unrecognized_confirmation_site() -> FakeSite {
    let review = "https://poshmark.com/account/review";
    FakeSite::new()
        .scene("payout", PAYOUT_URL, "Redeemable $12.00")
        .scene("review", review, "Review your details")
        .scene("done", review, "Processing")
        .route(PAYOUT_URL, "payout")
        .element(
            "payout",
            FakeElement::new(first_query(&strategies::payout_method())),
        )
        .element(
            "payout",
            FakeElement::new(first_query(&strategies::continue_button()))
                .on_click(Effect::Goto("review")),
        )
        .element(
            "review",
            FakeElement::new(first_query(&strategies::redeem_button()))
                .on_click(Effect::Goto("done")),
        )
}

#[tokio::test]
async fn unrecognized_confirmation_page_is_a_warning_by_default() {
    let dir = tempdir().expect("tempdir");
    let mut site = unrecognized_confirmation_site();
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");
    assert_eq!(
        outcome.state,
        TransferState::Completed(CompletionReason::TransferInitiated)
    );
}

#[tokio::test]
async fn strict_confirmation_fails_with_code_8() {
    let dir = tempdir().expect("tempdir");
    let mut site = unrecognized_confirmation_site();
    let mut config = test_config(dir.path());
    config.transfer.strict_confirmation = true;
    let mut workflow = TransferWorkflow::new(config, None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Failed(FailureReason::ConfirmationMismatch)
    );
    assert_eq!(outcome.exit_code(), 8);
    let redeem = first_query(&strategies::redeem_button());
    assert!(!site.clicked.contains(&redeem));
    assert!(has_screenshot(&file_names(dir.path()), "continue_failed"));
}

#[tokio::test]
async fn challenge_on_the_confirmation_page_stops_before_redeem() {
    let dir = tempdir().expect("tempdir");
    let mut site = payout_site("$12.00").scene(
        "confirm",
        CONFIRM_URL,
        "We noticed unusual activity. Confirm Redeem $12.00",
    );
    site = site.element(
        "confirm",
        FakeElement::new(first_query(&strategies::redeem_button())).on_click(Effect::Goto("done")),
    );
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Failed(FailureReason::SecurityChallenge)
    );
    assert_eq!(outcome.exit_code(), 4);
    assert!(outcome.history.contains(&TransferState::ConfirmingRedeem));
    assert!(!outcome.history.contains(&TransferState::Redeeming));
    let redeem = first_query(&strategies::redeem_button());
    assert!(!site.clicked.contains(&redeem));
    assert!(has_screenshot(&file_names(dir.path()), "security_challenge"));
}

#[tokio::test]
async fn spinner_that_never_clears_is_only_a_warning() {
    let dir = tempdir().expect("tempdir");
    let mut site = payout_site("$12.00");
    site.predicate_times_out = true;
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(site.predicate_waits, 1);
    assert_eq!(
        outcome.state,
        TransferState::Completed(CompletionReason::TransferInitiated)
    );
    assert_eq!(site.current_scene(), Some("done"));
}

#[tokio::test]
async fn navigation_failure_is_unexpected_and_captured() {
    let dir = tempdir().expect("tempdir");
    let mut site = payout_site("$12.00");
    site.fail_navigation = true;
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let err = workflow.run(&mut site).await.unwrap_err();

    assert!(matches!(err, WorkflowError::Navigation { .. }));
    // the screenshot attempt is made even though there is no page
    assert_eq!(site.screenshots, 1);
    assert!(has_screenshot(&file_names(dir.path()), "error"));
}

#[tokio::test]
async fn network_idle_timeout_is_only_a_warning() {
    let dir = tempdir().expect("tempdir");
    let mut site = payout_site("$12.00");
    site.network_idle_times_out = true;
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");
    assert_eq!(
        outcome.state,
        TransferState::Completed(CompletionReason::TransferInitiated)
    );
}

#[tokio::test]
async fn screenshot_failures_are_not_fatal() {
    let dir = tempdir().expect("tempdir");
    let mut site = payout_site("$12.00");
    site.fail_screenshots = true;
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Completed(CompletionReason::TransferInitiated)
    );
    assert!(outcome.screenshots.is_empty());
    assert!(file_names(dir.path()).is_empty());
}

#[tokio::test]
async fn overlays_are_cleared_before_the_balance_is_read() {
    let dir = tempdir().expect("tempdir");
    let got_it = first_query(&strategies::overlay_dismiss());
    let mut site = payout_site("$12.00").element(
        "payout",
        FakeElement::new(got_it.clone()).on_click(Effect::Remove),
    );
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let outcome = workflow.run(&mut site).await.expect("workflow");

    assert_eq!(
        outcome.state,
        TransferState::Completed(CompletionReason::TransferInitiated)
    );
    assert_eq!(site.clicked.first(), Some(&got_it));
}

#[tokio::test]
async fn balance_check_reads_without_clicking() {
    let dir = tempdir().expect("tempdir");
    let mut site = login_walled_site("$1,234.56");
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), credentials());

    let report = workflow.check_balance(&mut site).await.expect("check");

    assert_eq!(
        report,
        BalanceReport::Balance {
            balance: Some(Amount::from_cents(123_456)),
            threshold: Amount::from_cents(500),
            meets_threshold: true,
        }
    );
    let login_button = first_query(&strategies::login_submit());
    assert_eq!(site.clicked, vec![login_button]);
    let payout_queries: Vec<_> = strategies::payout_method()
        .into_iter()
        .map(|s| s.query)
        .collect();
    assert!(!site.located_any(&payout_queries));
}

#[tokio::test]
async fn balance_check_reports_blockers() {
    let dir = tempdir().expect("tempdir");
    let mut site = login_walled_site("$12.00");
    let mut workflow = TransferWorkflow::new(test_config(dir.path()), None);

    let report = workflow.check_balance(&mut site).await.expect("check");
    assert_eq!(
        report,
        BalanceReport::Blocked(FailureReason::MissingCredentials)
    );
}
