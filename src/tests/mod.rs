mod api_client_tests;
mod confirm_tests;
pub mod support;
