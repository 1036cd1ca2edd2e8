mod store_tests;
mod utils;
