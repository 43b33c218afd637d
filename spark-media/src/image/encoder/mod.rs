pub mod save_image;
