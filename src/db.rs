pub mod cammesa;
pub mod prod_db;
