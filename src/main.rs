fn main() {
    if let Err(err) = salesprep::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
