//! Integration tests for the Diesel stores against embedded PostgreSQL.
//!
//! Covers the transactional assign and its rollback on a duplicate day, the
//! completion-post join behind the streak lookups, keyset paging of the user
//! listing, and the embedded migrations. Tests use `pg-embed-setup-unpriv`
//! and drive the async stores through a per-test Tokio runtime.

use chrono::{NaiveDate, TimeDelta};
use futures_util::TryStreamExt as _;
use petcare_backend::domain::ports::{
    DailyTaskStore, DailyTaskStoreError, DeviceTokenStore, UserStore, UserStoreError,
};
use petcare_backend::domain::{AssignmentId, NewDailyTaskAssignment, PostId, TaskType, UserId};
use petcare_backend::outbound::persistence::{
    DbPool, DieselDailyTaskStore, DieselDeviceTokenStore, DieselUserStore, PoolConfig,
    run_pending_migrations,
};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use postgres::{Client, NoTls};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use uuid::Uuid;

mod support;

use support::{
    describe_postgres_error, handle_cluster_setup_failure, provision_empty_database,
    provision_migrated_database,
};

struct TestContext {
    runtime: Runtime,
    pool: DbPool,
    database_url: String,
    _database: TemporaryDatabase,
}

impl TestContext {
    fn client(&self) -> Client {
        Client::connect(self.database_url.as_str(), NoTls)
            .map_err(|err| describe_postgres_error(&err))
            .expect("seed connection")
    }

    fn seed_user(&self, streak: i32) -> UserId {
        let user_id = UserId::random();
        let id = *user_id.as_uuid();
        self.client()
            .execute(
                "INSERT INTO users (id, streak_count) VALUES ($1, $2)",
                &[&id, &streak],
            )
            .map_err(|err| describe_postgres_error(&err))
            .expect("seed user");
        user_id
    }

    fn link_post(&self, user_id: &UserId, assignment_id: &AssignmentId) -> PostId {
        let post = Uuid::new_v4();
        let owner = *user_id.as_uuid();
        let task = *assignment_id.as_uuid();
        self.client()
            .execute(
                "INSERT INTO posts (id, user_id, daily_task_id) VALUES ($1, $2, $3)",
                &[&post, &owner, &task],
            )
            .map_err(|err| describe_postgres_error(&err))
            .expect("seed post");
        PostId::from_uuid(post)
    }

    fn seed_device_token(&self, user_id: &UserId, device: &str, token: &str) {
        let id = Uuid::new_v4();
        let owner = *user_id.as_uuid();
        self.client()
            .execute(
                concat!(
                    "INSERT INTO device_tokens (id, user_id, device_id, token, platform) ",
                    "VALUES ($1, $2, $3, $4, 'android')"
                ),
                &[&id, &owner, &device, &token],
            )
            .map_err(|err| describe_postgres_error(&err))
            .expect("seed device token");
    }

    fn stored_streak(&self, user_id: &UserId) -> i32 {
        let id = *user_id.as_uuid();
        self.client()
            .query_one("SELECT streak_count FROM users WHERE id = $1", &[&id])
            .map_err(|err| describe_postgres_error(&err))
            .expect("streak row")
            .get(0)
    }

    fn assignment_rows(&self, user_id: &UserId) -> i64 {
        let id = *user_id.as_uuid();
        self.client()
            .query_one("SELECT COUNT(*) FROM daily_tasks WHERE user_id = $1", &[&id])
            .map_err(|err| describe_postgres_error(&err))
            .expect("count row")
            .get(0)
    }
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let database = provision_migrated_database()?;
    let database_url = database.url().to_string();

    let config = PoolConfig::new(database_url.as_str()).with_max_size(2);
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        pool,
        database_url,
        _database: database,
    })
}

#[fixture]
fn store_context() -> Option<TestContext> {
    match setup_context() {
        Ok(context) => Some(context),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date")
}

#[rstest]
fn assigning_twice_on_one_day_keeps_the_first_row_and_streak(store_context: Option<TestContext>) {
    let Some(context) = store_context else {
        eprintln!(
            "SKIP-TEST-CLUSTER: assigning_twice_on_one_day_keeps_the_first_row_and_streak skipped"
        );
        return;
    };
    let store = DieselDailyTaskStore::new(context.pool.clone());
    let user = context.seed_user(0);
    let first = NewDailyTaskAssignment::new(user, day(), TaskType::Eating);
    let second = NewDailyTaskAssignment::new(user, day(), TaskType::Playing);

    let (created, duplicate) = context.runtime.block_on(async {
        let created = store.assign(&first, 1).await;
        let duplicate = store.assign(&second, 7).await;
        (created, duplicate)
    });

    let created = created.expect("first assignment");
    assert_eq!(created.id, first.id);
    assert_eq!(created.task_type, TaskType::Eating);
    assert!(
        matches!(duplicate, Err(DailyTaskStoreError::DuplicateAssignment { .. })),
        "expected a duplicate, got {duplicate:?}"
    );
    assert_eq!(context.assignment_rows(&user), 1);
    assert_eq!(
        context.stored_streak(&user),
        1,
        "the duplicate's streak write is rolled back"
    );
}

#[rstest]
fn assigning_to_an_unknown_user_writes_nothing(store_context: Option<TestContext>) {
    let Some(context) = store_context else {
        eprintln!("SKIP-TEST-CLUSTER: assigning_to_an_unknown_user_writes_nothing skipped");
        return;
    };
    let store = DieselDailyTaskStore::new(context.pool.clone());
    let ghost = UserId::random();
    let request = NewDailyTaskAssignment::new(ghost, day(), TaskType::Sleeping);

    let result = context
        .runtime
        .block_on(async { store.assign(&request, 1).await });

    assert!(
        matches!(result, Err(DailyTaskStoreError::Query { .. })),
        "expected a query error, got {result:?}"
    );
    assert_eq!(context.assignment_rows(&ghost), 0);
}

#[rstest]
fn most_recent_before_reports_a_linked_post(store_context: Option<TestContext>) {
    let Some(context) = store_context else {
        eprintln!("SKIP-TEST-CLUSTER: most_recent_before_reports_a_linked_post skipped");
        return;
    };
    let store = DieselDailyTaskStore::new(context.pool.clone());
    let user = context.seed_user(0);
    let older = NewDailyTaskAssignment::new(user, day() - TimeDelta::days(2), TaskType::Eating);
    let yesterday = NewDailyTaskAssignment::new(user, day() - TimeDelta::days(1), TaskType::Playing);
    context.runtime.block_on(async {
        store.assign(&older, 1).await.expect("older assignment");
        store.assign(&yesterday, 2).await.expect("yesterday's assignment");
    });
    let post = context.link_post(&user, &yesterday.id);

    let (latest, earlier, on_day) = context.runtime.block_on(async {
        let latest = store.most_recent_before(&user, day()).await;
        let earlier = store.most_recent_before(&user, yesterday.target_date).await;
        let on_day = store.assignment_on(&user, yesterday.target_date).await;
        (latest, earlier, on_day)
    });

    let latest = latest.expect("lookup").expect("yesterday's assignment");
    assert_eq!(latest.assignment.id, yesterday.id);
    assert_eq!(latest.completion_post, Some(post));
    assert_eq!(latest.owner_streak, 2);
    assert!(latest.is_completed());

    let earlier = earlier.expect("lookup").expect("older assignment");
    assert_eq!(earlier.assignment.id, older.id);
    assert_eq!(earlier.completion_post, None);

    let on_day = on_day.expect("lookup").expect("assignment on the day");
    assert_eq!(on_day.assignment.id, yesterday.id);
    assert_eq!(on_day.completion_post, Some(post));
}

#[rstest]
fn lookups_without_history_return_none(store_context: Option<TestContext>) {
    let Some(context) = store_context else {
        eprintln!("SKIP-TEST-CLUSTER: lookups_without_history_return_none skipped");
        return;
    };
    let store = DieselDailyTaskStore::new(context.pool.clone());
    let user = context.seed_user(0);

    let (previous, today) = context.runtime.block_on(async {
        (
            store.most_recent_before(&user, day()).await,
            store.assignment_on(&user, day()).await,
        )
    });

    assert!(previous.expect("lookup").is_none());
    assert!(today.expect("lookup").is_none());
}

#[rstest]
#[case(5)]
#[case(4)]
fn listing_pages_across_the_boundary(store_context: Option<TestContext>, #[case] count: usize) {
    let Some(context) = store_context else {
        eprintln!("SKIP-TEST-CLUSTER: listing_pages_across_the_boundary skipped");
        return;
    };
    let store = DieselUserStore::with_page_size(context.pool.clone(), 2);
    let mut seeded: Vec<UserId> = (0..count).map(|_| context.seed_user(0)).collect();
    seeded.sort();

    let listed: Vec<UserId> = context
        .runtime
        .block_on(async { store.list_all().try_collect::<Vec<_>>().await })
        .expect("listing succeeds");

    assert_eq!(listed, seeded, "every user once, in key order");
}

#[rstest]
fn streak_writes_reach_known_users_only(store_context: Option<TestContext>) {
    let Some(context) = store_context else {
        eprintln!("SKIP-TEST-CLUSTER: streak_writes_reach_known_users_only skipped");
        return;
    };
    let store = DieselUserStore::new(context.pool.clone());
    let user = context.seed_user(3);

    let (known, unknown) = context.runtime.block_on(async {
        (
            store.set_streak(&user, 0).await,
            store.set_streak(&UserId::random(), 4).await,
        )
    });

    known.expect("known user");
    assert_eq!(context.stored_streak(&user), 0);
    assert!(
        matches!(unknown, Err(UserStoreError::UnknownUser { .. })),
        "expected an unknown user, got {unknown:?}"
    );
}

#[rstest]
fn device_tokens_are_listed_in_registration_order(store_context: Option<TestContext>) {
    let Some(context) = store_context else {
        eprintln!("SKIP-TEST-CLUSTER: device_tokens_are_listed_in_registration_order skipped");
        return;
    };
    let store = DieselDeviceTokenStore::new(context.pool.clone());
    let user = context.seed_user(0);
    context.seed_device_token(&user, "phone", "ExponentPushToken[first]");
    context.seed_device_token(&user, "tablet", "ExponentPushToken[second]");

    let tokens = context
        .runtime
        .block_on(async { store.list_all().await })
        .expect("token listing");

    let listed: Vec<&str> = tokens.iter().map(|token| token.token.as_str()).collect();
    assert_eq!(
        listed,
        vec!["ExponentPushToken[first]", "ExponentPushToken[second]"]
    );
    assert!(tokens.iter().all(|token| token.platform == "android"));
}

#[rstest]
fn migrations_apply_once() {
    let database = match provision_empty_database() {
        Ok(database) => database,
        Err(reason) => {
            let _: Option<()> = handle_cluster_setup_failure(reason);
            return;
        }
    };
    let url = database.url().to_string();

    let applied = run_pending_migrations(url.as_str()).expect("first run");
    let rerun = run_pending_migrations(url.as_str()).expect("second run");

    assert_eq!(applied.len(), 1, "applied: {applied:?}");
    assert!(rerun.is_empty(), "nothing pending on rerun: {rerun:?}");
}
