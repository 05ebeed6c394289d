pub mod cli_helpers;
