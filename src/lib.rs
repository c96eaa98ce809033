pub mod config;
pub mod postsign;
