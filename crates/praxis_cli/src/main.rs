//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `praxis_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("praxis_core ping={}", praxis_core::ping());
    println!("praxis_core version={}", praxis_core::core_version());
}
