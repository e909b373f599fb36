//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `papo_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("papo_core ping={}", papo_core::ping());
    println!("papo_core version={}", papo_core::core_version());
}
