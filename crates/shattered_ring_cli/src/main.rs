//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `shattered_ring_core` linkage without the Flutter runtime.
//! - Prove the migration chain applies to a fresh store.
//! - Keep output deterministic for quick local sanity checks.

use shattered_ring_core::db::migrations::latest_version;
use shattered_ring_core::db::open_db_in_memory;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("shattered_ring_core ping={}", shattered_ring_core::ping());
    println!(
        "shattered_ring_core version={}",
        shattered_ring_core::core_version()
    );

    let conn = match open_db_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("shattered_ring_core store=error error={err}");
            return ExitCode::FAILURE;
        }
    };
    match conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0)) {
        Ok(version) if version == latest_version() => {
            println!("shattered_ring_core schema_version={version}");
            ExitCode::SUCCESS
        }
        Ok(version) => {
            eprintln!(
                "shattered_ring_core store=error schema_version={version} expected={}",
                latest_version()
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("shattered_ring_core store=error error={err}");
            ExitCode::FAILURE
        }
    }
}
