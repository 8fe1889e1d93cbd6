mod approval_tests;
mod concurrency_tests;
mod test_utils;
