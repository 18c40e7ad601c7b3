fn main() {
    // ESP-IDF link/env plumbing is only relevant when targeting the chip;
    // host test builds carry no `espidf` feature and skip it.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
