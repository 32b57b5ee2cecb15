//! Wait Mechanisms Example
//!
//! Demonstrates the polling waits against a scripted page whose login
//! greeting shows up 400ms after the submit click:
//! - an immediate check racing the page
//! - `wait_for` with a visibility condition
//! - `wait_for_first` deciding between success and error markers
//! - a timeout carrying its selector, condition and budget
//!
//! # Running
//!
//! ```bash
//! cargo run --example wait_mechanisms -p pageprobe
//! ```

use pageprobe::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const HOME: &str = "https://cars.test/";

#[tokio::main]
async fn main() -> ProbeResult<()> {
    println!("=== Pageprobe Wait Mechanisms Example ===\n");

    let submit = Selector::css("button.login");
    let greeting = Selector::css("span.greeting");
    let error = Selector::css(".alert-danger");

    let shown = greeting.clone();
    let driver = Arc::new(
        MockDriver::new()
            .with_page(
                HOME,
                "Buggy Cars Rating",
                vec![
                    MockElement::keyed(submit.clone()).text("Login"),
                    MockElement::keyed(greeting.clone()).text("Hi, test").hidden(),
                    MockElement::keyed(error.clone()).text("Invalid username/password").hidden(),
                ],
            )
            .on_click(submit.clone(), Duration::from_millis(400), move |dom| {
                dom.show(&shown);
            }),
    );
    driver.navigate(HOME).await?;

    let waiter = Waiter::new(Arc::clone(&driver))
        .with_options(WaitOptions::new().with_timeout(2_000).with_poll_interval(50));
    let actions = Actions::new(waiter.clone());
    let extractor = Extractor::new(waiter.clone());
    let greeting = Locator::from_selector(greeting).named("greeting");
    let error = Locator::from_selector(error).named("login error");

    println!("--- Demo 1: Immediate check races the page ---\n");
    actions.click(&Locator::from_selector(submit).named("login button")).await?;
    println!("greeting visible right after click: {}", extractor.is_visible(&greeting).await?);

    println!("\n--- Demo 2: First marker wins ---\n");
    let candidates = [
        (greeting.clone(), WaitCondition::Visible),
        (error.clone(), WaitCondition::Visible),
    ];
    let (winner, _) = waiter.wait_for_first(&candidates).await?;
    println!("winner: {}", candidates[winner].0.name());
    println!("display name: {}", parse_display_name(&extractor.text(&greeting).await?)?);

    println!("\n--- Demo 3: Timeout ---\n");
    let quick = waiter
        .clone()
        .with_options(WaitOptions::new().with_timeout(300).with_poll_interval(100));
    match quick.wait_for(&error, WaitCondition::Visible).await {
        Ok(_) => println!("error marker unexpectedly shown"),
        Err(err) => println!("{} ({})", err, err.kind()),
    }

    println!("\n=== Wait Mechanisms Example Complete ===");
    Ok(())
}
