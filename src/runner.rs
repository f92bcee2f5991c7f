//! Load test orchestration: simulated users and their iteration loop.

use crate::client::BooksClient;
use crate::config::{TestConfig, WaitInterval};
use crate::metrics::{MetricsCollector, TestResults};
use crate::workload::{self, Action, ActionPicker, CreateOutcome, Outcome, UserState};
use indicatif::{ProgressBar, ProgressStyle};
use rand::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Executes a load test by running simulated users until the deadline.
pub struct LoadRunner {
    config: TestConfig,
}

impl LoadRunner {
    pub fn new(config: TestConfig) -> Self {
        Self { config }
    }

    /// Run the load test.
    pub async fn run(&self) -> anyhow::Result<TestResults> {
        println!("Starting load test: {}", self.config.name);
        println!("  Base URL: {}", self.config.base_url);
        println!("  Duration: {}s", self.config.duration_secs);
        println!("  Users: {}", self.config.users);
        println!(
            "  Wait between actions: {:.1}-{:.1}s",
            self.config.wait.min_secs, self.config.wait.max_secs
        );
        println!();

        // Create progress bar
        let pb = ProgressBar::new(self.config.duration_secs);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len}s {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("##-"),
        );

        // Shared state
        let metrics = Arc::new(Mutex::new(MetricsCollector::new()));
        let picker = Arc::new(ActionPicker::new(&self.config.weights));

        let start = Instant::now();
        let deadline = start + Duration::from_secs(self.config.duration_secs);

        // Spawn one task per simulated user; each owns its state and RNG.
        let mut handles = Vec::with_capacity(self.config.users as usize);
        for user_idx in 0..self.config.users {
            let client =
                BooksClient::new(&self.config.base_url, self.config.profile.traced())?;
            // Offset the seed per user so seeded runs are reproducible
            // without every user drawing the same sequence.
            let rng = match self.config.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(user_idx as u64)),
                None => StdRng::from_entropy(),
            };
            let user = SimulatedUser {
                client,
                picker: picker.clone(),
                rng,
                state: UserState::new(),
                wait: self.config.wait.clone(),
                attach_extra: self.config.profile.may_attach_extra(),
                metrics: metrics.clone(),
            };
            handles.push(tokio::spawn(user.run_until(deadline)));
        }

        while Instant::now() < deadline {
            sleep(Duration::from_millis(250)).await;
            pb.set_position(start.elapsed().as_secs().min(self.config.duration_secs));
        }

        pb.set_message("Waiting for in-flight requests...");
        for handle in handles {
            handle.await?;
        }

        pb.finish_with_message("Complete!");
        println!();

        let m = metrics.lock().await;
        Ok(m.results(self.config.name.clone(), self.config.users))
    }
}

/// One virtual user: private book-ID state, its own RNG, a shared picker.
struct SimulatedUser {
    client: BooksClient,
    picker: Arc<ActionPicker>,
    rng: StdRng,
    state: UserState,
    wait: WaitInterval,
    attach_extra: bool,
    metrics: Arc<Mutex<MetricsCollector>>,
}

impl SimulatedUser {
    async fn run_until(mut self, deadline: Instant) {
        loop {
            let pause = self
                .rng
                .gen_range(self.wait.min_secs..=self.wait.max_secs);
            sleep(Duration::from_secs_f64(pause)).await;
            if Instant::now() >= deadline {
                break;
            }

            let action = self.picker.pick(&mut self.rng);
            self.perform(action).await;

            if Instant::now() >= deadline {
                break;
            }
        }
    }

    /// Execute one action, classify it, and record the outcome. Request
    /// errors degrade to a recorded failure, never a panic or retry.
    async fn perform(&mut self, action: Action) {
        let started = Instant::now();
        let outcome = match action {
            Action::GetBook => {
                let id = workload::random_book_id(&mut self.rng);
                match self.client.get_book(id).await {
                    Ok(resp) => workload::classify_get_book(resp.status, id),
                    Err(e) => Outcome::Failure(format!("get_book request error: {e}")),
                }
            }
            Action::GetManyBooks => match self.client.get_many_books().await {
                Ok(resp) => workload::classify_get_many(resp.status),
                Err(e) => Outcome::Failure(format!("get_many_books request error: {e}")),
            },
            Action::CreateBook => {
                let attach = self.attach_extra && self.rng.gen_bool(0.5);
                let book = workload::generate_book(&mut self.rng, attach);
                match self.client.create_book(&book).await {
                    Ok(resp) => match workload::classify_create(resp.status, &resp.body) {
                        CreateOutcome::Created(id) => {
                            self.state.record_created(id);
                            Outcome::Success
                        }
                        CreateOutcome::Failed(reason) => Outcome::Failure(reason),
                    },
                    Err(e) => Outcome::Failure(format!("create_book request error: {e}")),
                }
            }
            Action::DeleteBook => {
                // Nothing created yet: skip without issuing a request or
                // recording an outcome.
                let Some(id) = self.state.pick_delete_target(&mut self.rng) else {
                    return;
                };
                match self.client.delete_book(id).await {
                    Ok(resp) => {
                        let outcome = workload::classify_delete(resp.status, id);
                        if outcome.is_success() {
                            self.state.confirm_deleted(id);
                        }
                        outcome
                    }
                    Err(e) => Outcome::Failure(format!("delete_book request error: {e}")),
                }
            }
        };

        let latency_us = started.elapsed().as_micros() as u64;
        let mut m = self.metrics.lock().await;
        match outcome {
            Outcome::Success => m.record_success(action, latency_us),
            Outcome::Failure(reason) => {
                tracing::debug!(action = action.name(), %reason, "action failed");
                m.record_failure(action, latency_us);
            }
        }
    }
}
