fn main() {
    // ESP-IDF builds need the sysenv link args; host builds need nothing.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
