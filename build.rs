//! Build script for contshadow.
//!
//! Warns about feature combinations that cost more than users usually expect.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DEBUG");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_CONTRACT_CHECKS");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DIAGNOSTICS");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_PARKING_LOT");

    let debug_enabled = env::var("CARGO_FEATURE_DEBUG").is_ok();
    let contract_checks_enabled = env::var("CARGO_FEATURE_CONTRACT_CHECKS").is_ok();
    let diagnostics_enabled = env::var("CARGO_FEATURE_DIAGNOSTICS").is_ok();
    let parking_lot_enabled = env::var("CARGO_FEATURE_PARKING_LOT").is_ok();

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let is_release = profile == "release";

    if !is_release {
        return;
    }

    // =========================================================================
    // Release build diagnostics
    // =========================================================================

    if debug_enabled {
        emit_warning("'debug' feature enabled in release build!");
        emit_note("Every annotation captures a backtrace and verifies its region.");
        emit_note("Set ShadowConfig::check_after_annotate = false to skip the verification.");
    }

    if contract_checks_enabled {
        emit_info("'contract-checks' enabled: annotation bounds are validated on every call");
    }

    if !diagnostics_enabled {
        emit_note("Release build without 'diagnostics': CS0xx-CS2xx reports are not written.");
        emit_note("Strict mode still applies.");
    }

    if !parking_lot_enabled {
        emit_note("Tip: enable 'parking_lot' for a cheaper shadow table lock:");
        emit_note("  contshadow = { version = \"0.1\", features = [\"parking_lot\"] }");
    }
}

// =============================================================================
// Diagnostic emission helpers
// =============================================================================

fn emit_info(msg: &str) {
    println!("cargo:warning=[contshadow] {}", msg);
}

fn emit_note(msg: &str) {
    println!("cargo:warning=[contshadow]    {}", msg);
}

fn emit_warning(msg: &str) {
    println!("cargo:warning=[contshadow] warning: {}", msg);
}
