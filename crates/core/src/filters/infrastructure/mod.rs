pub mod file_mask_loader;
