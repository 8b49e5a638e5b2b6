//! Student Placement Service - Main Entry Point
//!
//! Usage:
//!   cargo run --release -- [--env dev] [--port 8080]

use std::sync::Arc;

use anyhow::{Context, Result};

use student_placement::auth::JwtAuth;
use student_placement::config::{AppConfig, load_seed};
use student_placement::db::Database;
use student_placement::gateway::{self, state::AppState};
use student_placement::placement::{
    InMemoryStudentStore, PlacementService, StudentStore, TransferValidator, audit_channel,
    spawn_audit_logger,
};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = student_placement::logging::init_logging(&app_config);

    tracing::info!("Starting Student Placement Service in {} mode", env);

    let placement_config = &app_config.placement;

    // ==========================================================================
    // Student store: PostgreSQL when configured, otherwise in-memory + seed
    // ==========================================================================
    let (store, pg_db): (Arc<dyn StudentStore>, Option<Arc<Database>>) =
        if let Some(url) = &app_config.postgres_url {
            let db = Database::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            let store = db.student_store().await?;
            (Arc::new(store), Some(Arc::new(db)))
        } else {
            tracing::warn!("No postgres_url configured, using in-memory student store");
            (Arc::new(InMemoryStudentStore::new()), None)
        };

    // ==========================================================================
    // Audit sink
    // ==========================================================================
    let (audit_tx, audit_rx) = audit_channel(placement_config.audit_queue_size);
    let _audit_task = spawn_audit_logger(audit_rx);

    let service = Arc::new(PlacementService::new(
        store,
        TransferValidator::new(placement_config.grade_catalog()),
        placement_config.guard_config(),
        placement_config.batch_concurrency,
        audit_tx,
    ));

    match placement_config.seed_file_for(pg_db.is_some()) {
        Some(seed_file) => seed_students(&service, seed_file).await?,
        None => {
            if let Some(seed_file) = &placement_config.seed_file {
                tracing::info!("Seed file {} ignored: PostgreSQL store is active", seed_file);
            }
        }
    }

    let state = Arc::new(AppState::new(
        service,
        Arc::new(JwtAuth::new(app_config.jwt_secret.clone())),
        pg_db,
    ));

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    gateway::run_server(&app_config.gateway.host, port, state).await
}

/// Admit the students listed in `seed_file` into the in-memory store
async fn seed_students(service: &PlacementService, seed_file: &str) -> Result<()> {
    let students = load_seed(seed_file)?;
    let mut admitted = 0usize;
    for student in &students {
        match service.admit(student).await {
            Ok(()) => admitted += 1,
            Err(e) => tracing::warn!(student_id = %student.id, error = %e, "Seed entry skipped"),
        }
    }
    tracing::info!(admitted, total = students.len(), "Seed students loaded from {}", seed_file);
    Ok(())
}
