
mod rest_test;
mod sync_test;
