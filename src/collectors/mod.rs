// Storefront collectors: poll the Steam web API and append to the price store.

pub mod steam;
pub mod toplist;
