pub mod date_keys;
pub mod iso_bson_chrono;
