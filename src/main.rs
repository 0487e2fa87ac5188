fn main() {
    eprintln!("Use specific binaries:");
    eprintln!("  cargo run --bin server -- --port 4000");
    eprintln!("  cargo run --bin load -- trades.csv --at 2022-12-31T23:59:59Z");
    eprintln!("");
    eprintln!("Add --update flag to write loaded rows to the database:");
    eprintln!("  cargo run --bin load -- trades.csv --update");
}
