//! Tests for the rental ledger service.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    IdentityProviderError, MockIdentityProvider, MockRentalLedgerRepository,
};
use crate::domain::{BicycleStatus, DisplayName};

struct FixtureClock(DateTime<Utc>);

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
struct RecordingSleeper {
    pauses: Mutex<Vec<Duration>>,
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.pauses
            .lock()
            .expect("sleeper lock")
            .push(duration);
    }
}

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn known_user() -> MockIdentityProvider {
    let mut identity = MockIdentityProvider::new();
    identity.expect_user_exists().returning(|_| Ok(true));
    identity
}

fn make_service(
    repo: MockRentalLedgerRepository,
    identity: MockIdentityProvider,
    now: DateTime<Utc>,
) -> RentalLedgerService<MockRentalLedgerRepository, MockIdentityProvider> {
    RentalLedgerService::new(Arc::new(repo), Arc::new(identity), Arc::new(FixtureClock(now)))
        .with_retry_policy(RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(10),
        })
        .with_sleeper(Arc::new(RecordingSleeper::default()))
}

fn gear() -> Gear {
    Gear::new("Brompton C Line", "folding", 300).expect("valid gear")
}

#[rstest]
#[tokio::test]
async fn rent_opens_rental_stamped_with_clock(now: DateTime<Utc>) {
    let user = UserId::random();
    let bicycle = BicycleId::random();
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_open_rental()
        .withf(move |rental| rental.bicycle_id() == bicycle && rental.is_open())
        .times(1)
        .returning(|_| Ok(()));

    let service = make_service(repo, known_user(), now);
    let rental = service
        .rent_bicycle(&user, bicycle)
        .await
        .expect("rent succeeds");

    assert_eq!(rental.user_id(), &user);
    assert_eq!(rental.started_at(), now);
    assert!(rental.ended_at().is_none());
}

#[rstest]
#[tokio::test]
async fn rent_rejects_unknown_user_without_touching_storage(now: DateTime<Utc>) {
    let mut identity = MockIdentityProvider::new();
    identity.expect_user_exists().times(1).returning(|_| Ok(false));
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_open_rental().never();

    let service = make_service(repo, identity, now);
    let user = UserId::random();
    let error = service
        .rent_bicycle(&user, BicycleId::random())
        .await
        .expect_err("unknown user");

    assert_eq!(error, LedgerError::UnknownUser { user_id: user });
}

#[rstest]
#[tokio::test]
async fn rent_reports_identity_outage(now: DateTime<Utc>) {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_user_exists()
        .returning(|_| Err(IdentityProviderError::unavailable("timeout")));
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_open_rental().never();

    let service = make_service(repo, identity, now);
    let error = service
        .rent_bicycle(&UserId::random(), BicycleId::random())
        .await
        .expect_err("identity outage");

    assert!(matches!(error, LedgerError::IdentityUnavailable { .. }));
}

#[rstest]
#[tokio::test]
async fn rent_maps_conditional_update_miss_to_not_available(now: DateTime<Utc>) {
    let bicycle = BicycleId::random();
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_open_rental()
        .times(1)
        .returning(|rental| Err(LedgerRepositoryError::not_available(rental.bicycle_id().to_string())));

    let service = make_service(repo, known_user(), now);
    let error = service
        .rent_bicycle(&UserId::random(), bicycle)
        .await
        .expect_err("already rented");

    assert_eq!(error, LedgerError::NotAvailable { bicycle_id: bicycle });
}

#[rstest]
#[tokio::test]
async fn rent_retries_transient_failures_then_succeeds(now: DateTime<Utc>) {
    let mut repo = MockRentalLedgerRepository::new();
    let mut seq = mockall::Sequence::new();
    repo.expect_open_rental()
        .times(2)
        .in_sequence(&mut seq)
        .returning(|_| Err(LedgerRepositoryError::busy("deadlock detected")));
    repo.expect_open_rental()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let service = make_service(repo, known_user(), now);
    service
        .rent_bicycle(&UserId::random(), BicycleId::random())
        .await
        .expect("third attempt succeeds");
}

#[rstest]
#[tokio::test]
async fn rent_surfaces_exhausted_retries_as_transient(now: DateTime<Utc>) {
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_open_rental()
        .times(3)
        .returning(|_| Err(LedgerRepositoryError::busy("could not serialize access")));

    let service = make_service(repo, known_user(), now);
    let error = service
        .rent_bicycle(&UserId::random(), BicycleId::random())
        .await
        .expect_err("exhausted");

    assert!(matches!(error, LedgerError::StorageTransient { attempts: 3, .. }));
}

#[rstest]
#[tokio::test]
async fn rent_does_not_retry_permanent_failures(now: DateTime<Utc>) {
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_open_rental()
        .times(1)
        .returning(|_| Err(LedgerRepositoryError::query("relation does not exist")));

    let service = make_service(repo, known_user(), now);
    let error = service
        .rent_bicycle(&UserId::random(), BicycleId::random())
        .await
        .expect_err("permanent");

    assert!(matches!(error, LedgerError::StorageFatal { .. }));
}

#[rstest]
#[tokio::test]
async fn rent_maps_foreign_key_race_to_unknown_user(now: DateTime<Utc>) {
    let user = UserId::random();
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_open_rental()
        .returning(|rental| Err(LedgerRepositoryError::unknown_user(rental.user_id().to_string())));

    let service = make_service(repo, known_user(), now);
    let error = service
        .rent_bicycle(&user, BicycleId::random())
        .await
        .expect_err("user deleted mid-flight");

    assert_eq!(error, LedgerError::UnknownUser { user_id: user });
}

fn busy_then(
    repo: &mut MockRentalLedgerRepository,
    seq: &mut mockall::Sequence,
    rejection: LedgerRepositoryError,
) {
    repo.expect_open_rental()
        .times(1)
        .in_sequence(seq)
        .returning(|_| Err(LedgerRepositoryError::busy("server closed the connection")));
    repo.expect_open_rental()
        .times(1)
        .in_sequence(seq)
        .returning(move |_| Err(rejection.clone()));
}

#[rstest]
#[tokio::test]
async fn rent_confirms_commit_hidden_by_transient_failure(now: DateTime<Utc>) {
    let user = UserId::random();
    let bicycle = BicycleId::random();
    let mut repo = MockRentalLedgerRepository::new();
    let mut seq = mockall::Sequence::new();
    busy_then(
        &mut repo,
        &mut seq,
        LedgerRepositoryError::not_available(bicycle.to_string()),
    );
    let owner = user.clone();
    repo.expect_find_rental()
        .times(1)
        .returning(move |id| Ok(Some(Rental::from_parts(id, owner.clone(), bicycle, now, None))));

    let service = make_service(repo, known_user(), now);
    let rental = service
        .rent_bicycle(&user, bicycle)
        .await
        .expect("committed rental is reported");

    assert_eq!(rental.user_id(), &user);
    assert!(rental.is_open());
}

#[rstest]
#[tokio::test]
async fn rent_after_transient_failure_is_rejected_when_nothing_was_stored(now: DateTime<Utc>) {
    let bicycle = BicycleId::random();
    let mut repo = MockRentalLedgerRepository::new();
    let mut seq = mockall::Sequence::new();
    busy_then(
        &mut repo,
        &mut seq,
        LedgerRepositoryError::not_available(bicycle.to_string()),
    );
    repo.expect_find_rental().times(1).returning(|_| Ok(None));

    let service = make_service(repo, known_user(), now);
    let error = service
        .rent_bicycle(&UserId::random(), bicycle)
        .await
        .expect_err("someone else holds the bicycle");

    assert_eq!(error, LedgerError::NotAvailable { bicycle_id: bicycle });
}

#[rstest]
#[tokio::test]
async fn return_confirms_close_hidden_by_transient_failure(now: DateTime<Utc>) {
    let user = UserId::random();
    let bicycle = BicycleId::random();
    let mut repo = MockRentalLedgerRepository::new();
    let mut seq = mockall::Sequence::new();
    repo.expect_close_rental()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Err(LedgerRepositoryError::busy("server closed the connection")));
    repo.expect_close_rental()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|bicycle_id, _, _| {
            Err(LedgerRepositoryError::no_open_rental(bicycle_id.to_string()))
        });
    let renter = user.clone();
    repo.expect_rentals_for_bicycle()
        .with(eq(bicycle))
        .times(1)
        .returning(move |bicycle_id| {
            let started = now - chrono::Duration::hours(1);
            Ok(vec![
                Rental::open(renter.clone(), bicycle_id, started).closed_at(now),
            ])
        });

    let service = make_service(repo, known_user(), now);
    let rental = service
        .return_bicycle(&user, bicycle)
        .await
        .expect("committed return is reported");

    assert_eq!(rental.ended_at(), Some(now));
}

#[rstest]
#[case(ReturnPolicy::MatchRenter, true)]
#[case(ReturnPolicy::AnyRenter, false)]
#[tokio::test]
async fn return_applies_configured_renter_filter(
    now: DateTime<Utc>,
    #[case] policy: ReturnPolicy,
    #[case] filtered: bool,
) {
    let user = UserId::random();
    let bicycle = BicycleId::random();
    let expected_filter = filtered.then(|| user.clone());
    let renter = user.clone();
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_close_rental()
        .with(eq(bicycle), eq(expected_filter), eq(now))
        .times(1)
        .returning(move |bicycle_id, _, at| {
            Ok(Rental::open(renter.clone(), bicycle_id, at - chrono::Duration::hours(1)).closed_at(at))
        });

    let service = make_service(repo, known_user(), now).with_return_policy(policy);
    let rental = service
        .return_bicycle(&user, bicycle)
        .await
        .expect("return succeeds");

    assert_eq!(rental.ended_at(), Some(now));
}

#[rstest]
#[tokio::test]
async fn return_without_open_rental_fails(now: DateTime<Utc>) {
    let bicycle = BicycleId::random();
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_close_rental()
        .times(1)
        .returning(|bicycle_id, _, _| {
            Err(LedgerRepositoryError::no_open_rental(bicycle_id.to_string()))
        });

    let service = make_service(repo, known_user(), now);
    let error = service
        .return_bicycle(&UserId::random(), bicycle)
        .await
        .expect_err("nothing open");

    assert_eq!(error, LedgerError::NoOpenRental { bicycle_id: bicycle });
}

#[rstest]
#[tokio::test]
async fn list_bicycle_reports_unknown_id(now: DateTime<Utc>) {
    let bicycle = BicycleId::random();
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_find_bicycle().returning(|_| Ok(None));

    let service = make_service(repo, known_user(), now);
    let error = service
        .list_bicycle(bicycle)
        .await
        .expect_err("missing bicycle");

    assert_eq!(error, LedgerError::UnknownBicycle { bicycle_id: bicycle });
}

#[rstest]
#[tokio::test]
async fn list_available_passes_through_listings(now: DateTime<Utc>) {
    let owner = UserId::random();
    let listing = BicycleListing {
        bicycle: Bicycle::listed(
            owner,
            Location::new("Harbour Street").expect("location"),
            gear(),
        ),
        owner_name: Some(DisplayName::new("Ada").expect("name")),
    };
    let returned = listing.clone();
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_list_available()
        .times(1)
        .return_once(move || Ok(vec![returned]));

    let service = make_service(repo, known_user(), now);
    let listings = service.list_available().await.expect("listings");

    assert_eq!(listings, vec![listing]);
}

#[rstest]
#[tokio::test]
async fn add_bicycle_lists_it_as_available(now: DateTime<Utc>) {
    let owner = UserId::random();
    let mut repo = MockRentalLedgerRepository::new();
    repo.expect_insert_bicycle()
        .withf(|bicycle| bicycle.status() == BicycleStatus::Available)
        .times(1)
        .returning(|_| Ok(()));

    let service = make_service(repo, known_user(), now);
    let bicycle = service
        .add_bicycle(
            &owner,
            Location::new("Station Square").expect("location"),
            gear(),
        )
        .await
        .expect("listing succeeds");

    assert_eq!(bicycle.owner(), Some(&owner));
    assert_eq!(bicycle.status(), BicycleStatus::Available);
}
