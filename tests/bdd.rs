use std::{fmt, sync::Arc};

use chrono::NaiveDate;
use cucumber::{given, then, when, World as _};
use tempfile::TempDir;
use trips::{
    error::AppError,
    models::{
        trip::{TripDraft, TripPatch, TripRecord},
        user::UserIdentity,
    },
    services::{
        storage::{FileStore, KeyValueStore},
        trips::TripStore,
        view,
    },
};

#[derive(Debug, cucumber::World, Default)]
struct TripWorld {
    state: Option<TestState>,
    identity: Option<UserIdentity>,
    last_error: Option<AppError>,
}

impl TripWorld {
    fn state(&self) -> &TestState {
        self.state.as_ref().expect("store must be initialised first")
    }

    fn identity(&self) -> &UserIdentity {
        self.identity.as_ref().expect("a user must be logged in")
    }

    fn trips(&self) -> Vec<TripRecord> {
        self.state().trips.load(self.identity()).expect("load trips")
    }

    fn trip_named(&self, destination: &str) -> TripRecord {
        self.trips()
            .into_iter()
            .find(|trip| trip.destination == destination)
            .expect("trip should exist")
    }
}

struct TestState {
    trips: TripStore,
    files: FileStore,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    fn new() -> anyhow::Result<Self> {
        let root = TempDir::new()?;
        let files = FileStore::new(root.path().join("data"));
        files.ensure_structure()?;
        let trips = TripStore::new(Arc::new(files.clone()));
        Ok(Self {
            trips,
            files,
            _root: root,
        })
    }
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid test date")
}

#[given("a fresh trip store")]
async fn given_fresh_store(world: &mut TripWorld) {
    world.state = Some(TestState::new().expect("state"));
    world.identity = None;
    world.last_error = None;
}

#[given(regex = r#"^I am logged in as "([^"]+)"$"#)]
async fn given_logged_in(world: &mut TripWorld, email: String) {
    log_in(world, email);
}

#[when(regex = r#"^I log in as "([^"]+)"$"#)]
async fn when_log_in(world: &mut TripWorld, email: String) {
    log_in(world, email);
}

fn log_in(world: &mut TripWorld, email: String) {
    let identity = UserIdentity::new(email).expect("identity");
    world
        .state()
        .trips
        .ensure_list(&identity)
        .expect("ensure list");
    world.identity = Some(identity);
}

#[when(
    regex = r#"^I add a trip to "([^"]*)" from "([^"]*)" to "([^"]*)" with budget "([^"]*)"$"#
)]
async fn add_trip(
    world: &mut TripWorld,
    destination: String,
    start_date: String,
    end_date: String,
    budget: String,
) {
    let draft = TripDraft {
        destination,
        start_date,
        end_date,
        budget,
        notes: String::new(),
    };
    world.last_error = world.state().trips.add(world.identity(), &draft).err();
}

#[when(regex = r#"^I move the end of trip "([^"]+)" to "([^"]+)"$"#)]
async fn move_end(world: &mut TripWorld, destination: String, end_date: String) {
    let trip = world.trip_named(&destination);
    let patch = TripPatch {
        end_date: Some(end_date),
        ..TripPatch::default()
    };
    world.last_error = world
        .state()
        .trips
        .update(world.identity(), trip.id, patch)
        .err();
}

#[when(regex = r#"^I delete trip "([^"]+)" twice$"#)]
async fn delete_twice(world: &mut TripWorld, destination: String) {
    let trip = world.trip_named(&destination);
    for _ in 0..2 {
        world
            .state()
            .trips
            .remove(world.identity(), trip.id)
            .expect("delete should succeed");
    }
}

#[when(regex = r#"^the stored trip list is overwritten with "([^"]*)"$"#)]
async fn corrupt_list(world: &mut TripWorld, raw: String) {
    let key = TripStore::derive_key(world.identity());
    world.state().files.set(&key, &raw).expect("raw write");
}

#[then(regex = r"^I have (\d+) stored trips$")]
async fn stored_trips(world: &mut TripWorld, expected: usize) {
    assert_eq!(view::total_count(&world.trips()), expected);
}

#[then(regex = r"^the total budget is (\d+)$")]
async fn total_budget(world: &mut TripWorld, expected: u32) {
    assert_eq!(view::total_budget(&world.trips()), f64::from(expected));
}

#[then(regex = r#"^the next trip on "([^"]+)" is "([^"]+)"$"#)]
async fn next_trip(world: &mut TripWorld, today: String, destination: String) {
    let trips = world.trips();
    let upcoming = view::next_upcoming(&trips, date(&today)).expect("an upcoming trip");
    assert_eq!(upcoming.destination, destination);
}

#[then(regex = r#"^there is no next trip on "([^"]+)"$"#)]
async fn no_next_trip(world: &mut TripWorld, today: String) {
    assert!(view::next_upcoming(&world.trips(), date(&today)).is_none());
}

#[then(regex = r#"^the last change is rejected for "([^"]+)"$"#)]
async fn rejected_for(world: &mut TripWorld, field: String) {
    match world.last_error.as_ref() {
        Some(AppError::Validation(err)) => assert_eq!(err.field().as_str(), field),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[then(regex = r#"^trip "([^"]+)" ends on "([^"]+)"$"#)]
async fn trip_ends_on(world: &mut TripWorld, destination: String, end_date: String) {
    assert_eq!(world.trip_named(&destination).end_date, date(&end_date));
}

#[tokio::main]
async fn main() {
    TripWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
