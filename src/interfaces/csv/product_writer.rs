use crate::domain::product::Product;
use crate::error::Result;
use std::io::Write;

/// Writes products as CSV with an `id,name,price,stock` header.
pub struct ProductWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ProductWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    pub fn write_products(&mut self, products: impl IntoIterator<Item = Product>) -> Result<()> {
        // The header is written by hand so an empty catalog still gets one.
        self.writer.write_record(["id", "name", "price", "stock"])?;
        for product in products {
            self.writer.serialize(&product)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::{Money, ProductId};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_writes_header_and_rows() {
        let id = ProductId(Uuid::nil());
        let product = Product::new(id, "Mug", Money::new(dec!(4.50)), 3);

        let mut buffer = Vec::new();
        ProductWriter::new(&mut buffer)
            .write_products(vec![product])
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "id,name,price,stock\n00000000-0000-0000-0000-000000000000,Mug,4.50,3\n"
        );
    }
}
