//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the core and the CLI MUST NOT call sleep
//! methods. Sessions wait on I/O and on their cancellation token, never on a
//! timer.
//! **Exceptions**: test code

use architectural_enforcement::find_violations;

const SLEEP_CALLS: &[&str] = &["::sleep(", ".sleep(", "sleep_until("];

fn report(violations: &[String]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    eprintln!("\n✅ Wait on the response stream or on the session's cancellation token instead.");

    panic!(
        "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
        violations.len()
    );
}

#[test]
fn test_no_sleep_in_core() {
    report(&find_violations("chatstream/core/src", SLEEP_CALLS));
}

#[test]
fn test_no_sleep_in_cli() {
    report(&find_violations("chatstream/cli/src", SLEEP_CALLS));
}
