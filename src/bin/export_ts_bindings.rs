//! Writes the TypeScript types for `ViewEvent` and friends.
//!
//! Usage: `export_ts_bindings [out-dir]` (defaults to `bindings`).

use std::env;
use std::path::PathBuf;

const DEFAULT_OUT_DIR: &str = "bindings";

fn out_dir_from_args(mut args: impl Iterator<Item = String>) -> PathBuf {
    args.next()
        .filter(|arg| !arg.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR))
}

fn main() {
    let out_dir = out_dir_from_args(env::args().skip(1));
    if let Err(err) = lesson_core::export_ts_bindings(&out_dir) {
        eprintln!("failed to export TS bindings: {err}");
        std::process::exit(1);
    }
    println!("exported TS bindings to {}", out_dir.display());
}
