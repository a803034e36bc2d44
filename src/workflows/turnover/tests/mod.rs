mod common;

mod ingestion;
