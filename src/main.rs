fn main() {
    if let Err(e) = detparse::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
