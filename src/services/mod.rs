pub mod classifier;
pub mod image_service;
pub mod preview_service;
pub mod view_controller;
