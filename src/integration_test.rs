pub mod test_util;

mod task_api;
