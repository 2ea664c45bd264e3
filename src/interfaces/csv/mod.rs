pub mod catalog_reader;
pub mod product_writer;
