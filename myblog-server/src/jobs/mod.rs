pub mod algolia;
