pub mod tesseract;

pub use tesseract::TesseractCli;
