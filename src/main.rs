fn main() {
    if let Err(err) = uxflow::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
