pub mod generate;
pub mod health;
pub mod oauth;
pub mod proxy;
