mod response;

pub use response::{exit_code_for_error, format_failure, print_error_json, print_success};
