// SPDX-License-Identifier: Apache-2.0 OR MIT
// Example demonstrating the ringlog engine, macros, and global registry
//
// Run with: cargo run --example logging_demo

use anyhow::Result;
use ringlog::{log_error, log_info, log_warn, Logger, Severity};

fn main() -> Result<()> {
    println!("=== ringlog demo ===\n");

    let log_dir = std::env::temp_dir().join("ringlog_demo");
    std::fs::create_dir_all(&log_dir)?;

    println!("1. File engine with macros:");
    let file_path = log_dir.join("demo.log");
    let logger = Logger::new(&file_path, Severity::Debug)?;
    log_info!(logger, "engine started");
    log_warn!(logger, "queue depth {}", 3);
    log_error!(logger, "failed to reach {}: {}", "10.0.0.1", "timeout");
    logger.sync();
    println!("   wrote {} ({} bytes so far)", file_path.display(), logger.current_file_size());

    println!("\n2. Level filtering:");
    logger.set_level(Severity::Error);
    log_info!(logger, "this record is filtered at the producer");
    log_error!(logger, "this record passes");
    logger.sync();
    drop(logger);

    println!("\n3. Console engine (direct descriptor writes):");
    let console = Logger::console(Severity::Debug);
    log_info!(console, "hello from the console engine");
    console.sync();
    console.wait_until_empty();
    drop(console);

    println!("\n4. Global registry:");
    ringlog::set_log_file_path(&log_dir);
    ringlog::set_default_log_file("demo_global.log");
    ringlog::glog!(Severity::Info, "via the default global logger");
    ringlog::glog_to!("demo_other.log", Severity::Warn, "via a named global logger");
    if let Ok(global) = ringlog::default_file_logger() {
        global.sync();
    }

    println!("\nlog files are under {}", log_dir.display());
    Ok(())
}
