pub mod ascii_grid;
pub mod csv_io;
pub mod deck_io;
pub mod echo;
pub mod ini_parser;
pub mod report_io;
