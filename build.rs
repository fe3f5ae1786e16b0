fn main() {
    // ESP-IDF link/env propagation is only meaningful when building for the
    // chip; host builds (tests, fuzzing) skip it.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
