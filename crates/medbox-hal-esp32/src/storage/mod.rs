pub mod flash_store;
