fn main() {
    if let Err(err) = folio_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
