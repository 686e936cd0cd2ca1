mod admin;
mod catalog;
mod health_check;
mod payments;
mod test_utils;
