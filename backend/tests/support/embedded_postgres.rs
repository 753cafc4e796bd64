//! Embedded PostgreSQL databases for the Diesel adapter suites.
//!
//! Each test gets its own database cloned from a template that has the
//! crate's embedded migrations applied. The template name carries a hash of
//! `migrations/`, so editing a migration provisions a fresh template.
//!
//! A cluster that cannot start skips the calling test with a
//! `SKIP-TEST-CLUSTER` marker. Set `REQUIRE_TEST_CLUSTER=1` to turn that into
//! a failure.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use petcare_backend::outbound::persistence::run_pending_migrations;
use pg_embedded_setup_unpriv::test_support::{hash_directory, shared_cluster_handle};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use uuid::Uuid;

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const TEMPLATE_NAME_PREFIX: &str = "petcare_template";
const EMPTY_TEMPLATE: &str = "template0";

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn template_database_name() -> Result<String, String> {
    let hash =
        hash_directory(migrations_dir()).map_err(|err| format!("hash migrations: {err}"))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

fn new_test_database_name() -> String {
    format!("test_{}", Uuid::new_v4().simple())
}

fn cluster() -> Result<&'static ClusterHandle, String> {
    shared_cluster_handle().map_err(|err| format!("start embedded cluster: {err:?}"))
}

/// Create the migrated template once per migration set.
fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, String> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&template_name);
        run_pending_migrations(&url).map_err(|err| format!("migrate template: {err}"))?;
    }

    Ok(template_name)
}

/// Temporary database with every migration applied.
pub fn provision_migrated_database() -> Result<TemporaryDatabase, String> {
    let cluster = cluster()?;
    let template_name = ensure_template_database(cluster)?;
    cluster
        .temporary_database_from_template(new_test_database_name().as_str(), template_name.as_str())
        .map_err(|err| format!("create database from template: {err:?}"))
}

/// Temporary database with no schema at all.
pub fn provision_empty_database() -> Result<TemporaryDatabase, String> {
    cluster()?
        .temporary_database_from_template(new_test_database_name().as_str(), EMPTY_TEMPLATE)
        .map_err(|err| format!("create empty database: {err:?}"))
}

fn requires_test_cluster() -> bool {
    std::env::var("REQUIRE_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip the calling test when the cluster is unavailable, or fail when
/// `REQUIRE_TEST_CLUSTER` is truthy.
pub fn handle_cluster_setup_failure<T>(reason: impl Display) -> Option<T> {
    assert!(
        !requires_test_cluster(),
        "Test cluster setup failed: {reason}. Unset REQUIRE_TEST_CLUSTER to skip."
    );
    eprintln!("SKIP-TEST-CLUSTER: {reason}");
    None
}
