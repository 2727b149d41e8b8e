fn main() {
    if let Err(err) = table_insight::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
