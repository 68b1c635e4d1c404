//! Strict mode turns reported inconsistencies into panics.
//!
//! Kept in its own test binary: strict mode is process-wide and would make
//! unrelated tests panic while it is raised.

use contshadow::diagnostics::{init_from_env, strict_mode};
use contshadow::{
    clear_death_callback, set_death_callback, ContainerShadow, GranuleState, MemoryShadow,
    ShadowConfig, ShadowTable, StrictMode, StrictModeGuard,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

static DEATHS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn test_strict_mode_panics_after_death_callback() {
    let shadow = ContainerShadow::new(MemoryShadow::new(), ShadowConfig::minimal());
    let (beg, end) = (0x1000, 0x1040);
    shadow.annotate(beg, end, end, beg + 16);
    shadow.with_table(|t| t.write_granule(beg + 16, GranuleState::Valid));

    // Warn: reported, not fatal
    assert_eq!(strict_mode(), StrictMode::Warn);
    assert!(!shadow.check(beg, beg + 16, end));

    set_death_callback(|| {
        DEATHS.fetch_add(1, Ordering::SeqCst);
    });

    {
        let _guard = StrictModeGuard::panic_on_error();
        assert_eq!(strict_mode(), StrictMode::PanicOnError);

        let result = catch_unwind(AssertUnwindSafe(|| shadow.check(beg, beg + 16, end)));
        let payload = result.expect_err("strict mode should panic");
        let message = payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(message.contains("CS101"), "panic message: {}", message);

        // consistent regions never reach the diagnostics layer
        shadow.with_table(|t| t.write_granule(beg + 16, GranuleState::RESERVED));
        assert!(shadow.check(beg, beg + 16, end));
    }

    assert_eq!(strict_mode(), StrictMode::Warn);
    assert_eq!(DEATHS.load(Ordering::SeqCst), 1);
    clear_death_callback();

    // the table lock was released before the panic
    assert_eq!(shadow.stats().verify_failures, 2);
    shadow.annotate(beg, end, beg + 16, end);
    assert!(shadow.verify(beg, end, end));

    // unset variable leaves the mode alone
    std::env::remove_var("CONTSHADOW_STRICT");
    init_from_env();
    assert_eq!(strict_mode(), StrictMode::Warn);
}
