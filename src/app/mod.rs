pub mod ports;
pub mod purchase_use_case;
pub mod download_use_case;
pub mod review_use_case;
pub mod catalog_use_case;
