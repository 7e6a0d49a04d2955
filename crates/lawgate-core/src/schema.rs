/// Arrow schema definitions for the reference corpus.
pub mod corpus {
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    /// LanceDB table holding embedded reference documents.
    pub const REFERENCE_DOCUMENTS_TABLE: &str = "reference_documents";

    /// Schema for embedded reference documents.
    ///
    /// `doc_id` is the document's position in the loaded corpus, so search
    /// hits map straight back to the in-memory documents.
    pub fn reference_documents_schema(dim: i32) -> Schema {
        Schema::new(vec![
            Field::new("doc_id", DataType::UInt32, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("body", DataType::Utf8, false),
            Field::new("jurisdiction", DataType::Utf8, true),
            Field::new("content_type", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
                false,
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::corpus;
    use arrow::datatypes::DataType;

    #[test]
    fn reference_documents_schema_has_expected_fields() {
        let schema = corpus::reference_documents_schema(384);
        assert_eq!(schema.fields().len(), 6);
        assert!(schema.field_with_name("doc_id").is_ok());
        assert!(schema.field_with_name("jurisdiction").unwrap().is_nullable());
    }

    #[test]
    fn embedding_width_follows_dim() {
        let schema = corpus::reference_documents_schema(4);
        match schema.field_with_name("embedding").unwrap().data_type() {
            DataType::FixedSizeList(_, n) => assert_eq!(*n, 4),
            other => panic!("unexpected embedding type {other:?}"),
        }
    }
}
