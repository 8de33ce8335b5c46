pub mod db;
pub mod etl;
