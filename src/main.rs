fn main() {
    if let Err(err) = csv_glance::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
