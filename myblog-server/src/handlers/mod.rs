pub mod gist;
pub mod sitemap;
pub mod spa;
pub mod storage;
