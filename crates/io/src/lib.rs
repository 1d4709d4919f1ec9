// File I/O - depreciation report PDFs, SIAFI spreadsheets, rendered outputs

pub mod pdf;
pub mod prepare;
pub mod report;
pub mod sheet;
