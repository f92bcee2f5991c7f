//! Workload model: weighted action selection, per-user book state,
//! payload generation, and outcome classification.
//!
//! Everything here is pure logic so the selection policy and the
//! success/failure rules can be tested without a server.

use crate::config::ActionWeights;
use rand::distributions::Alphanumeric;
use rand::prelude::*;
use serde::Serialize;
use serde_json::Value;

/// Book IDs requested by get_book are drawn from this closed range.
pub const BOOK_ID_MIN: i64 = 1;
pub const BOOK_ID_MAX: i64 = 90;

/// Size of the random binary blob hex-encoded into `extra-data`.
pub const EXTRA_DATA_BYTES: usize = 1000;

/// One discrete unit of work a simulated user can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    GetBook,
    GetManyBooks,
    CreateBook,
    DeleteBook,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::GetBook,
        Action::GetManyBooks,
        Action::CreateBook,
        Action::DeleteBook,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Action::GetBook => "get_book",
            Action::GetManyBooks => "get_many_books",
            Action::CreateBook => "create_book",
            Action::DeleteBook => "delete_book",
        }
    }
}

/// Draws actions with probability proportional to their configured weight.
pub struct ActionPicker {
    cumulative: Vec<(Action, f64)>,
}

impl ActionPicker {
    /// Build the cumulative distribution from relative weights.
    pub fn new(weights: &ActionWeights) -> Self {
        let pairs = [
            (Action::GetBook, weights.get_book),
            (Action::GetManyBooks, weights.get_many_books),
            (Action::CreateBook, weights.create_book),
            (Action::DeleteBook, weights.delete_book),
        ];
        let total: f64 = pairs.iter().map(|(_, w)| w).sum();

        let mut cumulative = Vec::with_capacity(pairs.len());
        let mut sum = 0.0;
        for (action, weight) in pairs {
            sum += weight / total;
            cumulative.push((action, sum));
        }

        Self { cumulative }
    }

    /// Draw one action.
    pub fn pick(&self, rng: &mut impl Rng) -> Action {
        let r: f64 = rng.gen();
        for &(action, cum) in &self.cumulative {
            if r <= cum {
                return action;
            }
        }
        // Fallback for floating point edge (shouldn't happen)
        self.cumulative
            .last()
            .map(|&(a, _)| a)
            .unwrap_or(Action::GetBook)
    }
}

/// Per-user state: IDs of books this user created and has not yet deleted.
///
/// Owned by a single user task for its whole lifetime, never shared.
#[derive(Debug, Default)]
pub struct UserState {
    created_ids: Vec<i64>,
}

impl UserState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed-created book ID.
    pub fn record_created(&mut self, id: i64) {
        self.created_ids.push(id);
    }

    /// Pick a deletion candidate uniformly from the tracked IDs, or None
    /// when there is nothing to delete (the action is then skipped).
    pub fn pick_delete_target(&self, rng: &mut impl Rng) -> Option<i64> {
        self.created_ids.choose(rng).copied()
    }

    /// Drop an ID after a confirmed successful delete.
    pub fn confirm_deleted(&mut self, id: i64) {
        if let Some(pos) = self.created_ids.iter().position(|&x| x == id) {
            self.created_ids.remove(pos);
        }
    }

    pub fn tracked_ids(&self) -> &[i64] {
        &self.created_ids
    }

    pub fn is_empty(&self) -> bool {
        self.created_ids.is_empty()
    }
}

/// Request body for create_book.
#[derive(Debug, Clone, Serialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(rename = "extra-data", skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<String>,
}

fn random_alnum(rng: &mut impl Rng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate a random book payload. When `attach_extra` is set a 1000-byte
/// random blob is hex-encoded under `extra-data`.
pub fn generate_book(rng: &mut impl Rng, attach_extra: bool) -> NewBook {
    let title = format!("Book {}", random_alnum(rng, 8));
    let author = format!("Author {}", random_alnum(rng, 5));
    let extra_data = if attach_extra {
        let mut blob = vec![0u8; EXTRA_DATA_BYTES];
        rng.fill_bytes(&mut blob);
        Some(hex::encode(blob))
    } else {
        None
    };
    NewBook {
        title,
        author,
        extra_data,
    }
}

/// Pick a random book ID for get_book.
pub fn random_book_id(rng: &mut impl Rng) -> i64 {
    rng.gen_range(BOOK_ID_MIN..=BOOK_ID_MAX)
}

/// Success/failure classification of one action's HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Outcome of create_book, carrying the new ID on success so the caller
/// can track it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(i64),
    Failed(String),
}

/// get_book succeeds only on 200; the failure message names the ID.
pub fn classify_get_book(status: u16, book_id: i64) -> Outcome {
    if status == 200 {
        Outcome::Success
    } else {
        Outcome::Failure(format!(
            "failed to retrieve book with ID {} (status {})",
            book_id, status
        ))
    }
}

/// The collection GET succeeds only on 200.
pub fn classify_get_many(status: u16) -> Outcome {
    if status == 200 {
        Outcome::Success
    } else {
        Outcome::Failure(format!("failed to retrieve book collection (status {})", status))
    }
}

/// create_book succeeds iff the status is 200/201 and the body decodes to
/// a truthy book ID. The server returns a bare JSON integer; an object
/// with an integer `id` field is also accepted.
pub fn classify_create(status: u16, body: &str) -> CreateOutcome {
    if status != 200 && status != 201 {
        return CreateOutcome::Failed(format!("failed to create book (status {})", status));
    }
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return CreateOutcome::Failed("failed to decode JSON response".to_string()),
    };
    match extract_book_id(&value) {
        Some(id) if id != 0 => CreateOutcome::Created(id),
        _ => CreateOutcome::Failed("no ID returned in response".to_string()),
    }
}

/// delete_book succeeds on 200 or 204.
pub fn classify_delete(status: u16, book_id: i64) -> Outcome {
    if status == 200 || status == 204 {
        Outcome::Success
    } else {
        Outcome::Failure(format!(
            "failed to delete book with ID {} (status {})",
            book_id, status
        ))
    }
}

fn extract_book_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::Object(map) => map.get("id").and_then(Value::as_i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_picker_distribution_follows_weights() {
        let picker = ActionPicker::new(&ActionWeights::default());
        let mut rng = seeded_rng();
        let mut counts: HashMap<Action, u64> = HashMap::new();
        let draws = 100_000;
        for _ in 0..draws {
            *counts.entry(picker.pick(&mut rng)).or_default() += 1;
        }
        // Weights are 100:1:2:3, so get_book should land near 94.3%.
        let get_frac = counts[&Action::GetBook] as f64 / draws as f64;
        assert!((get_frac - 100.0 / 106.0).abs() < 0.01);
        assert!(counts[&Action::DeleteBook] > counts[&Action::CreateBook]);
        assert!(counts[&Action::CreateBook] > counts[&Action::GetManyBooks]);
    }

    #[test]
    fn test_picker_covers_all_actions() {
        let picker = ActionPicker::new(&ActionWeights::default());
        let mut rng = seeded_rng();
        let mut seen: HashMap<Action, u64> = HashMap::new();
        for _ in 0..10_000 {
            *seen.entry(picker.pick(&mut rng)).or_default() += 1;
        }
        for action in Action::ALL {
            assert!(seen.contains_key(&action), "{} never drawn", action.name());
        }
    }

    #[test]
    fn test_random_book_id_in_range() {
        let mut rng = seeded_rng();
        for _ in 0..1_000 {
            let id = random_book_id(&mut rng);
            assert!((BOOK_ID_MIN..=BOOK_ID_MAX).contains(&id));
        }
    }

    #[test]
    fn test_generated_payload_shape() {
        let mut rng = seeded_rng();
        let book = generate_book(&mut rng, false);

        let title_suffix = book.title.strip_prefix("Book ").unwrap();
        assert_eq!(title_suffix.len(), 8);
        assert!(title_suffix.chars().all(|c| c.is_ascii_alphanumeric()));

        let author_suffix = book.author.strip_prefix("Author ").unwrap();
        assert_eq!(author_suffix.len(), 5);
        assert!(author_suffix.chars().all(|c| c.is_ascii_alphanumeric()));

        assert!(book.extra_data.is_none());
    }

    #[test]
    fn test_extra_data_is_hex_of_expected_size() {
        let mut rng = seeded_rng();
        let book = generate_book(&mut rng, true);
        let extra = book.extra_data.unwrap();
        assert_eq!(extra.len(), EXTRA_DATA_BYTES * 2);
        assert!(extra.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_payload_serialization_omits_absent_extra() {
        let book = NewBook {
            title: "Book abcd1234".to_string(),
            author: "Author xy9ZQ".to_string(),
            extra_data: None,
        };
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["title"], "Book abcd1234");
        assert_eq!(json["author"], "Author xy9ZQ");
        assert!(json.get("extra-data").is_none());

        let with_extra = NewBook {
            extra_data: Some("deadbeef".to_string()),
            ..book
        };
        let json = serde_json::to_value(&with_extra).unwrap();
        assert_eq!(json["extra-data"], "deadbeef");
    }

    #[test]
    fn test_classify_get_book_404_names_id() {
        let outcome = classify_get_book(404, 91);
        match outcome {
            Outcome::Failure(msg) => assert!(msg.contains("91")),
            Outcome::Success => panic!("404 must not classify as success"),
        }
        assert!(classify_get_book(200, 12).is_success());
    }

    #[test]
    fn test_classify_get_many() {
        assert!(classify_get_many(200).is_success());
        assert!(!classify_get_many(503).is_success());
    }

    #[test]
    fn test_classify_create_bare_integer_201() {
        assert_eq!(classify_create(201, "42"), CreateOutcome::Created(42));
        assert_eq!(classify_create(200, "7"), CreateOutcome::Created(7));
    }

    #[test]
    fn test_classify_create_object_body() {
        assert_eq!(
            classify_create(201, r#"{"id": 42}"#),
            CreateOutcome::Created(42)
        );
    }

    #[test]
    fn test_classify_create_failures() {
        assert!(matches!(
            classify_create(500, "42"),
            CreateOutcome::Failed(_)
        ));
        assert!(matches!(
            classify_create(200, "not json"),
            CreateOutcome::Failed(_)
        ));
        // A zero ID is falsy, as is a null body.
        assert!(matches!(classify_create(200, "0"), CreateOutcome::Failed(_)));
        assert!(matches!(
            classify_create(200, "null"),
            CreateOutcome::Failed(_)
        ));
        assert!(matches!(
            classify_create(201, r#"{"title": "x"}"#),
            CreateOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_create_then_track_exactly_once() {
        let mut state = UserState::new();
        if let CreateOutcome::Created(id) = classify_create(201, r#"{"id": 42}"#) {
            state.record_created(id);
        }
        assert_eq!(state.tracked_ids(), &[42]);
        assert_eq!(state.tracked_ids().iter().filter(|&&x| x == 42).count(), 1);
    }

    #[test]
    fn test_failed_create_leaves_state_unchanged() {
        let mut state = UserState::new();
        if let CreateOutcome::Created(id) = classify_create(500, "42") {
            state.record_created(id);
        }
        assert!(state.is_empty());
    }

    #[test]
    fn test_delete_204_removes_tracked_id() {
        let mut state = UserState::new();
        state.record_created(42);
        let mut rng = seeded_rng();
        let target = state.pick_delete_target(&mut rng).unwrap();
        assert_eq!(target, 42);
        if classify_delete(204, target).is_success() {
            state.confirm_deleted(target);
        }
        assert!(state.is_empty());
    }

    #[test]
    fn test_failed_delete_retains_id() {
        let mut state = UserState::new();
        state.record_created(42);
        let mut rng = seeded_rng();
        let target = state.pick_delete_target(&mut rng).unwrap();
        if classify_delete(500, target).is_success() {
            state.confirm_deleted(target);
        }
        assert_eq!(state.tracked_ids(), &[42]);
    }

    #[test]
    fn test_delete_with_no_tracked_ids_is_skipped() {
        let state = UserState::new();
        let mut rng = seeded_rng();
        assert!(state.pick_delete_target(&mut rng).is_none());
    }

    #[test]
    fn test_delete_target_drawn_from_tracked_ids() {
        let mut state = UserState::new();
        for id in [3, 14, 159] {
            state.record_created(id);
        }
        let mut rng = seeded_rng();
        for _ in 0..100 {
            let target = state.pick_delete_target(&mut rng).unwrap();
            assert!(state.tracked_ids().contains(&target));
        }
    }
}
