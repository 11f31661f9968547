pub mod dashboard;
pub mod list;
pub mod task;

#[cfg(test)]
mod test_util;
