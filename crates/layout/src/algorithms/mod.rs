pub mod pagination;

#[cfg(test)]
mod pagination_test;
